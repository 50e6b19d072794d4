//! # 프레임 길이 커리큘럼
//!
//! 학습 진행(에포크)에 따라 지도 학습 호라이즌을 계단식으로 늘린다.
//! 긴 롤아웃은 초기에 발산하기 쉬우므로 짧은 클립부터 학습한다.

use serde::{Deserialize, Serialize};

use super::error::{VideoError, VideoResult};

/// 커리큘럼 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumConfig {
    /// 전체 호라이즌을 나누는 증가 구간 수
    pub increase_intervals: usize,
    /// 구간 하나가 지속되는 에포크 수
    pub epochs_per_interval: usize,
    /// 최소 지도 프레임 수
    pub min_frames: usize,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            increase_intervals: 10,
            epochs_per_interval: 20,
            min_frames: 8,
        }
    }
}

impl CurriculumConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_increase_intervals(mut self, intervals: usize) -> Self {
        self.increase_intervals = intervals;
        self
    }

    pub fn with_epochs_per_interval(mut self, epochs: usize) -> Self {
        self.epochs_per_interval = epochs;
        self
    }

    pub fn with_min_frames(mut self, frames: usize) -> Self {
        self.min_frames = frames;
        self
    }

    pub fn validate(&self) -> VideoResult<()> {
        if self.increase_intervals == 0 {
            return Err(VideoError::invalid_config("increase_intervals must be positive"));
        }
        if self.epochs_per_interval == 0 {
            return Err(VideoError::invalid_config("epochs_per_interval must be positive"));
        }
        if self.min_frames == 0 {
            return Err(VideoError::invalid_config("min_frames must be positive"));
        }
        Ok(())
    }

    /// 에포크에 대한 지도 호라이즌
    ///
    /// `floor(total / intervals) * (epoch / epochs_per_interval + 1)` 을
    /// `[min(min_frames, total), total]` 로 클램프한다. 에포크만으로 결정된다.
    pub fn horizon_for(&self, epoch: usize, total_horizon: usize) -> usize {
        let per_interval = total_horizon / self.increase_intervals.max(1);
        let stage = epoch / self.epochs_per_interval.max(1) + 1;
        let allowed = per_interval.saturating_mul(stage).min(total_horizon);
        allowed.max(self.min_frames.min(total_horizon))
    }

    /// 호라이즌이 `total_horizon` 에 처음 도달하는 에포크
    pub fn saturation_epoch(&self, total_horizon: usize) -> usize {
        let per_interval = total_horizon / self.increase_intervals.max(1);
        if per_interval == 0 || self.min_frames >= total_horizon {
            return 0;
        }
        let stages = (total_horizon + per_interval - 1) / per_interval;
        (stages - 1) * self.epochs_per_interval
    }
}

/// 기본 커리큘럼(10구간, 구간당 20에포크, 최소 8프레임)의 호라이즌
pub fn horizon_for(epoch: usize, total_horizon: usize) -> usize {
    CurriculumConfig::default().horizon_for(epoch, total_horizon)
}
