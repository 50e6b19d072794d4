use approx::assert_abs_diff_eq;
use candle_core::{Device, Tensor};

use crate::core::error::{VideoError, VideoResult};
use crate::core::training::{clip_l1_loss, frame_l1, supervised_length};
use crate::core::types::Clip;

/// 프레임 i 의 모든 픽셀이 values[i] 인 클립
fn constant_clip(values: &[f32]) -> VideoResult<Clip> {
    let frames = values
        .iter()
        .map(|&v| Tensor::full(v, (1, 3, 4, 4), &Device::Cpu))
        .collect::<candle_core::Result<Vec<_>>>()?;
    Clip::new(frames)
}

#[test]
fn 지도_길이_테스트() {
    assert_eq!(supervised_length(6, 5, 8), 5);
    assert_eq!(supervised_length(8, 60, 8), 8);
    assert_eq!(supervised_length(3, 10, 8), 3);
    assert_eq!(supervised_length(8, 8, 0), 0);
}

#[test]
fn 짧은_타깃_절단_테스트() -> VideoResult<()> {
    // 예측 6, 타깃 5, 호라이즌 8 -> T = 5, 프레임 1..=4 만 손실에 들어감
    let predicted = constant_clip(&[0.0, 0.1, 0.2, 0.3, 0.4, 0.9])?;
    let target = constant_clip(&[0.5, 0.0, 0.0, 0.0, 0.0])?;

    let result = clip_l1_loss(&predicted, &target, 8)?;
    assert_eq!(result.supervised_len, 5);
    assert_eq!(result.trace.x(), vec![1, 2, 3, 4]);

    let expected = (0.1 + 0.2 + 0.3 + 0.4) / 5.0;
    assert_abs_diff_eq!(result.value()?, expected, epsilon = 1e-6);
    for (point, want) in result.trace.points().iter().zip([0.1f32, 0.2, 0.3, 0.4]) {
        assert_abs_diff_eq!(point.loss, want, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn 첫_프레임_제외_테스트() -> VideoResult<()> {
    let predicted = constant_clip(&[1.0, 0.5, 0.5])?;
    let target = constant_clip(&[0.0, 0.5, 0.5])?;

    let result = clip_l1_loss(&predicted, &target, 3)?;
    assert_abs_diff_eq!(result.value()?, 0.0, epsilon = 1e-7);
    Ok(())
}

#[test]
fn 단일_프레임_손실은_0() -> VideoResult<()> {
    let predicted = constant_clip(&[0.3, 0.7])?;
    let target = constant_clip(&[0.9, 0.1])?;

    let result = clip_l1_loss(&predicted, &target, 1)?;
    assert_eq!(result.supervised_len, 1);
    assert!(result.trace.is_empty());
    assert_eq!(result.value()?, 0.0);
    Ok(())
}

#[test]
fn 손실_계산_멱등성_테스트() -> VideoResult<()> {
    let predicted = constant_clip(&[0.0, 0.25, 0.75, 1.0])?;
    let target = constant_clip(&[0.0, 0.5, 0.5, 0.5])?;

    let a = clip_l1_loss(&predicted, &target, 4)?;
    let b = clip_l1_loss(&predicted, &target, 4)?;
    assert_eq!(a.value()?, b.value()?);
    assert_eq!(a.trace, b.trace);
    assert_abs_diff_eq!(a.trace.mean().unwrap_or(f32::NAN), 1.0 / 3.0, epsilon = 1e-6);
    Ok(())
}

#[test]
fn 형상_불일치_오류_테스트() -> VideoResult<()> {
    let dev = Device::Cpu;
    let a = Tensor::zeros((1, 3, 4, 4), candle_core::DType::F32, &dev)?;
    let b = Tensor::zeros((1, 3, 8, 8), candle_core::DType::F32, &dev)?;
    assert!(matches!(
        frame_l1(&a, &b),
        Err(VideoError::ShapeMismatch { .. })
    ));

    let empty = Clip::new(Vec::new())?;
    let target = constant_clip(&[0.0])?;
    assert!(matches!(
        clip_l1_loss(&empty, &target, 4),
        Err(VideoError::DegenerateHorizon(0))
    ));
    Ok(())
}
