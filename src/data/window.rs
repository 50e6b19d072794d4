//! 시간 창 선택과 프레임 솎아내기

use candle_core::Tensor;
use rand::Rng;

use crate::core::error::{VideoError, VideoResult};
use crate::core::types::Clip;

/// 원본 클립에서 잘라낼 구간 (초)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipWindow {
    pub start: f64,
    pub end: f64,
}

impl ClipWindow {
    /// `[clip_start, clip_end - max_length]` 에서 시작점을 균등 추출
    ///
    /// 원본이 `max_length` 보다 짧으면 원본 전체를 쓴다.
    pub fn sample<R: Rng + ?Sized>(
        clip_start: f64,
        clip_end: f64,
        max_length: f64,
        rng: &mut R,
    ) -> VideoResult<Self> {
        if !(clip_end > clip_start) || !(max_length > 0.0) {
            return Err(VideoError::invalid_config(format!(
                "invalid clip window [{}, {}] with max length {}",
                clip_start, clip_end, max_length
            )));
        }
        let latest_start = clip_end - max_length;
        let start = if latest_start > clip_start {
            rng.gen_range(clip_start..=latest_start)
        } else {
            clip_start
        };
        Ok(Self {
            start,
            end: (start + max_length).min(clip_end),
        })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// 창 안에 들어가는 프레임 시각들
    pub fn frame_times(&self, fps: usize) -> Vec<f64> {
        // 부동소수 오차 보정
        let count = (self.duration() * fps as f64 + 1e-6).floor() as usize;
        (0..count)
            .map(|i| self.start + i as f64 / fps as f64)
            .collect()
    }
}

/// `skip` 프레임마다 하나씩 (`T / skip` 개)
pub fn subsample_frames<T: Clone>(frames: &[T], skip: usize) -> Vec<T> {
    if skip <= 1 {
        return frames.to_vec();
    }
    (0..frames.len() / skip)
        .map(|i| frames[i * skip].clone())
        .collect()
}

/// 타깃을 전체 호라이즌 이하로 자른다
pub fn truncate_target(clip: Clip, max_len: usize) -> Clip {
    clip.truncate(max_len)
}

/// 프레임 목록을 솎아낸 뒤 클립으로 묶는다
pub fn clip_from_frames(frames: &[Tensor], skip: usize) -> VideoResult<Clip> {
    Clip::new(subsample_frames(frames, skip))
}
