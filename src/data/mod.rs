//! # 학습 데이터
//!
//! 샘플 하나는 조건 프레임과 타깃 클립의 쌍이다. 비디오 디코딩과 클립 목록 관리는
//! 이 크레이트 밖의 일이고, 여기서는 그 결과를 학습 루프가 받는 형태로 맞춘다.

pub mod augment;
pub mod synthetic;
pub mod window;

pub use augment::{CropRegion, RandomCrop};
pub use synthetic::SyntheticClipSource;
pub use window::{subsample_frames, truncate_target, ClipWindow};

use candle_core::{Device, Tensor};

use crate::core::error::{VideoError, VideoResult};
use crate::core::types::Clip;

/// 조건 프레임 + 타깃 클립
#[derive(Debug, Clone)]
pub struct ClipSample {
    /// `(N, C, H, W)`, [0, 1]
    pub conditioning_frame: Tensor,
    /// 타깃 프레임 0 은 조건 프레임과 같다
    pub target_clip: Clip,
}

impl ClipSample {
    pub fn new(conditioning_frame: Tensor, target_clip: Clip) -> Self {
        Self {
            conditioning_frame,
            target_clip,
        }
    }

    /// 타깃의 첫 프레임을 조건 프레임으로 사용
    pub fn from_target(target_clip: Clip) -> VideoResult<Self> {
        let conditioning_frame = target_clip
            .frame(0)
            .cloned()
            .ok_or(VideoError::DegenerateHorizon(0))?;
        Ok(Self::new(conditioning_frame, target_clip))
    }

    pub fn truncate_target(self, max_len: usize) -> Self {
        Self {
            conditioning_frame: self.conditioning_frame,
            target_clip: truncate_target(self.target_clip, max_len),
        }
    }

    pub fn to_device(&self, device: &Device) -> VideoResult<Self> {
        Ok(Self {
            conditioning_frame: self.conditioning_frame.to_device(device)?,
            target_clip: self.target_clip.map_frames(|f| f.to_device(device))?,
        })
    }
}

/// 학습 샘플 공급자
pub trait ClipSource {
    fn next_sample(&mut self) -> VideoResult<ClipSample>;
}
