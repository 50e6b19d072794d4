use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};

use crate::core::error::{VideoError, VideoResult};
use crate::core::model::{ConvLstmCell, RecurrentState};

fn build_cell(input: usize, hidden: usize) -> VideoResult<(VarMap, ConvLstmCell)> {
    let var_map = VarMap::new();
    let vb = VarBuilder::from_varmap(&var_map, DType::F32, &Device::Cpu);
    let cell = ConvLstmCell::new(input, hidden, 3, vb.pp("lstm"))?;
    Ok((var_map, cell))
}

fn state(n: usize, hidden: usize, h: usize, w: usize) -> VideoResult<RecurrentState> {
    let dev = Device::Cpu;
    RecurrentState::new(
        Tensor::rand(-1f32, 1f32, (n, hidden, h, w), &dev)?,
        Tensor::rand(-1f32, 1f32, (n, hidden, h, w), &dev)?,
    )
}

#[test]
fn 스텝_출력_형상_테스트() -> VideoResult<()> {
    let (_vm, cell) = build_cell(5, 4)?;
    let input = Tensor::rand(-1f32, 1f32, (2, 5, 8, 6), &Device::Cpu)?;

    let next = cell.step(&input, state(2, 4, 8, 6)?)?;
    assert_eq!(next.hidden.dims(), &[2, 4, 8, 6]);
    assert_eq!(next.cell.dims(), &[2, 4, 8, 6]);
    assert_eq!(cell.hidden_channels(), 4);
    Ok(())
}

#[test]
fn hidden_값_범위_테스트() -> VideoResult<()> {
    let (_vm, cell) = build_cell(3, 3)?;
    let input = Tensor::rand(-1f32, 1f32, (1, 3, 4, 4), &Device::Cpu)?;

    let next = cell.step(&input, state(1, 3, 4, 4)?)?;
    // h = o * tanh(c), o ∈ (0, 1)
    let values = next.hidden.flatten_all()?.to_vec1::<f32>()?;
    assert!(values.iter().all(|v| v.abs() <= 1.0));
    Ok(())
}

#[test]
fn 같은_입력_재투입시_상태_진화_테스트() -> VideoResult<()> {
    let (_vm, cell) = build_cell(4, 4)?;
    let context = Tensor::rand(-1f32, 1f32, (1, 4, 4, 4), &Device::Cpu)?;

    let first = cell.step(&context, state(1, 4, 4, 4)?)?;
    let second = cell.step(&context, first.clone())?;

    let diff: f32 = first
        .hidden
        .sub(&second.hidden)?
        .abs()?
        .sum_all()?
        .to_scalar()?;
    assert!(diff > 0.0, "같은 컨텍스트여도 hidden 은 순환 업데이트로 변해야 함");
    Ok(())
}

#[test]
fn 상태_형상_불일치_오류_테스트() -> VideoResult<()> {
    let (_vm, cell) = build_cell(4, 4)?;
    let input = Tensor::zeros((1, 4, 4, 4), DType::F32, &Device::Cpu)?;

    // hidden 채널 불일치
    let wrong = state(1, 2, 4, 4)?;
    assert!(matches!(
        cell.step(&input, wrong),
        Err(VideoError::ShapeMismatch { .. })
    ));

    // 공간 해상도 불일치
    let wrong = state(1, 4, 2, 2)?;
    assert!(matches!(
        cell.step(&input, wrong),
        Err(VideoError::ShapeMismatch { .. })
    ));

    // 입력 채널 불일치
    let bad_input = Tensor::zeros((1, 3, 4, 4), DType::F32, &Device::Cpu)?;
    assert!(matches!(
        cell.step(&bad_input, state(1, 4, 4, 4)?),
        Err(VideoError::ShapeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn 순환상태_생성_검증_테스트() -> VideoResult<()> {
    let dev = Device::Cpu;
    let hidden = Tensor::zeros((1, 4, 4, 4), DType::F32, &dev)?;
    let cell = Tensor::zeros((1, 4, 2, 2), DType::F32, &dev)?;
    assert!(RecurrentState::new(hidden, cell).is_err());
    Ok(())
}
