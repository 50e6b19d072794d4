//! 랜덤 크롭 증강
//!
//! 크롭 크기는 네트워크 stride 의 배수로 내림한다. 클립의 모든 프레임에 같은 영역을 적용한다.

use rand::Rng;

use crate::core::error::{VideoError, VideoResult};
use crate::core::types::Clip;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub top: usize,
    pub left: usize,
    pub height: usize,
    pub width: usize,
}

#[derive(Debug, Clone)]
pub struct RandomCrop {
    stride: usize,
    min_scale: f64,
    enabled: bool,
}

impl RandomCrop {
    pub fn new(stride: usize, enabled: bool) -> Self {
        Self {
            stride: stride.max(1),
            min_scale: 0.75,
            enabled,
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// 한 축의 (offset, size)
    fn extent<R: Rng + ?Sized>(&self, dim: usize, rng: &mut R) -> (usize, usize) {
        if !self.enabled {
            return (0, dim / self.stride * self.stride);
        }
        let lower = (dim as f64 * self.min_scale) as usize;
        let raw = rng.gen_range(lower.min(dim)..=dim);
        let mut size = raw / self.stride * self.stride;
        if size == 0 {
            size = self.stride;
        }
        let offset = if size >= dim {
            0
        } else {
            rng.gen_range(0..dim - size)
        };
        (offset, size)
    }

    pub fn sample_region<R: Rng + ?Sized>(
        &self,
        height: usize,
        width: usize,
        rng: &mut R,
    ) -> VideoResult<CropRegion> {
        if height < self.stride || width < self.stride {
            return Err(VideoError::StrideMismatch {
                height,
                width,
                stride: self.stride,
            });
        }
        let (top, crop_h) = self.extent(height, rng);
        let (left, crop_w) = self.extent(width, rng);
        Ok(CropRegion {
            top,
            left,
            height: crop_h,
            width: crop_w,
        })
    }

    pub fn apply<R: Rng + ?Sized>(&self, clip: &Clip, rng: &mut R) -> VideoResult<Clip> {
        let Some((_n, _c, h, w)) = clip.frame_dims()? else {
            return Ok(clip.clone());
        };
        let region = self.sample_region(h, w, rng)?;
        crop_clip(clip, region)
    }
}

pub fn crop_clip(clip: &Clip, region: CropRegion) -> VideoResult<Clip> {
    clip.map_frames(|frame| {
        frame
            .narrow(2, region.top, region.height)?
            .narrow(3, region.left, region.width)
    })
}
