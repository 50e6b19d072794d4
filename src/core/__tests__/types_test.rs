use candle_core::{DType, Device, Tensor};

use crate::core::error::{VideoError, VideoResult};
use crate::core::types::{as_frame_batch, to_signed_range, to_unit_range, Clip};

#[test]
fn 범위_변환_왕복_테스트() -> VideoResult<()> {
    let frame = Tensor::new(&[0.0f32, 0.25, 1.0], &Device::Cpu)?;
    let signed = to_signed_range(&frame)?;
    assert_eq!(signed.to_vec1::<f32>()?, vec![-1.0, -0.5, 1.0]);
    assert_eq!(to_unit_range(&signed)?.to_vec1::<f32>()?, vec![0.0, 0.25, 1.0]);
    Ok(())
}

#[test]
fn 프레임_배치_승격_테스트() -> VideoResult<()> {
    let dev = Device::Cpu;
    let single = Tensor::zeros((3, 4, 4), DType::F32, &dev)?;
    assert_eq!(as_frame_batch(&single)?.dims(), &[1, 3, 4, 4]);

    let batch = Tensor::zeros((2, 3, 4, 4), DType::F32, &dev)?;
    assert_eq!(as_frame_batch(&batch)?.dims(), &[2, 3, 4, 4]);

    let flat = Tensor::zeros((3, 4), DType::F32, &dev)?;
    assert!(matches!(
        as_frame_batch(&flat),
        Err(VideoError::ShapeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn 클립_형상_일치_검증_테스트() -> VideoResult<()> {
    let dev = Device::Cpu;
    let a = Tensor::zeros((1, 3, 4, 4), DType::F32, &dev)?;
    let b = Tensor::zeros((1, 3, 8, 8), DType::F32, &dev)?;
    assert!(Clip::new(vec![a.clone(), b]).is_err());

    let clip = Clip::new(vec![a.clone(), a.clone(), a])?;
    assert_eq!(clip.len(), 3);
    assert_eq!(clip.frame_dims()?, Some((1, 3, 4, 4)));
    assert_eq!(clip.truncate(2).len(), 2);

    let empty = Clip::new(Vec::new())?;
    assert!(empty.is_empty());
    assert_eq!(empty.frame_dims()?, None);
    assert!(matches!(
        empty.to_tensor(),
        Err(VideoError::DegenerateHorizon(0))
    ));
    Ok(())
}

#[test]
fn 비디오_텐서_분해_스택_테스트() -> VideoResult<()> {
    let video = Tensor::rand(0f32, 1f32, (2, 5, 3, 4, 4), &Device::Cpu)?;
    let clip = Clip::from_video_tensor(&video)?;
    assert_eq!(clip.len(), 5);
    assert_eq!(clip.frame_dims()?, Some((2, 3, 4, 4)));

    let restacked = clip.to_tensor()?;
    let diff: f32 = restacked.sub(&video)?.abs()?.sum_all()?.to_scalar()?;
    assert_eq!(diff, 0.0);
    Ok(())
}
