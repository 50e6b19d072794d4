//! # 프레임과 클립
//!
//! 프레임은 `(N, C, H, W)` 배치 텐서 하나, 클립은 시간 순서대로 나열된 프레임들이다.
//! 입출력 경계에서는 [0, 1], 내부에서는 [-1, 1] 범위를 사용한다.

use candle_core::{Result as CandleResult, Tensor};

use super::error::{VideoError, VideoResult};

/// 프레임 형상 `(batch, channels, height, width)`
pub type FrameDims = (usize, usize, usize, usize);

/// [0, 1] -> [-1, 1]
pub fn to_signed_range(frame: &Tensor) -> CandleResult<Tensor> {
    frame.affine(2.0, -1.0)
}

/// [-1, 1] -> [0, 1]
pub fn to_unit_range(frame: &Tensor) -> CandleResult<Tensor> {
    frame.affine(0.5, 0.5)
}

/// 단일 프레임 `(C, H, W)` 은 배치 1로 승격, `(N, C, H, W)` 는 그대로
pub fn as_frame_batch(frame: &Tensor) -> VideoResult<Tensor> {
    match frame.rank() {
        3 => Ok(frame.unsqueeze(0)?),
        4 => Ok(frame.clone()),
        _ => Err(VideoError::shape_mismatch(
            "(C, H, W) or (N, C, H, W)",
            format!("{:?}", frame.dims()),
        )),
    }
}

/// 시간 순서 프레임 시퀀스
///
/// 모든 프레임은 동일한 `(N, C, H, W)` 형상을 가진다.
#[derive(Debug, Clone)]
pub struct Clip {
    frames: Vec<Tensor>,
}

impl Clip {
    /// 프레임 목록으로 클립 생성 (형상 일치 검증)
    pub fn new(frames: Vec<Tensor>) -> VideoResult<Self> {
        if let Some(first) = frames.first() {
            let expected = first.dims4()?;
            for (index, frame) in frames.iter().enumerate().skip(1) {
                let dims = frame.dims4()?;
                if dims != expected {
                    return Err(VideoError::shape_mismatch(
                        format!("{:?}", expected),
                        format!("{:?} at frame {}", dims, index),
                    ));
                }
            }
        }
        Ok(Self { frames })
    }

    /// `(N, T, C, H, W)` 비디오 텐서를 시간축으로 분해
    pub fn from_video_tensor(video: &Tensor) -> VideoResult<Self> {
        let (_n, t, _c, _h, _w) = video.dims5()?;
        let frames = (0..t)
            .map(|i| video.narrow(1, i, 1)?.squeeze(1))
            .collect::<CandleResult<Vec<_>>>()?;
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&Tensor> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Tensor] {
        &self.frames
    }

    /// 프레임 형상, 빈 클립이면 None
    pub fn frame_dims(&self) -> VideoResult<Option<FrameDims>> {
        match self.frames.first() {
            Some(frame) => Ok(Some(frame.dims4()?)),
            None => Ok(None),
        }
    }

    /// 앞에서부터 최대 `len` 프레임만 유지
    pub fn truncate(mut self, len: usize) -> Self {
        self.frames.truncate(len);
        self
    }

    /// 모든 프레임에 같은 변환 적용
    pub fn map_frames<F>(&self, f: F) -> VideoResult<Self>
    where
        F: Fn(&Tensor) -> CandleResult<Tensor>,
    {
        let frames = self
            .frames
            .iter()
            .map(&f)
            .collect::<CandleResult<Vec<_>>>()?;
        Self::new(frames)
    }

    /// `(N, T, C, H, W)` 로 스택
    pub fn to_tensor(&self) -> VideoResult<Tensor> {
        if self.frames.is_empty() {
            return Err(VideoError::DegenerateHorizon(0));
        }
        Ok(Tensor::stack(&self.frames, 1)?)
    }
}
