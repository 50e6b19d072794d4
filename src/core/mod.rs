//! # 비디오 합성 핵심 모듈
//!
//! 단일 프레임 조건의 순환 비디오 생성기와 커리큘럼 학습 루프

pub mod config;
pub mod curriculum;
pub mod error;
pub mod model;
pub mod optimizers;
pub mod training;
pub mod types;

pub use config::{ModelConfig, TrainingConfig};
pub use curriculum::CurriculumConfig;
pub use error::{VideoError, VideoResult};
pub use model::SequenceGenerator;
pub use optimizers::{AdamConfig, AdamOptimizer, OptimizerConfig};
pub use training::{EpochSummary, StepReport, TrainingSession};
pub use types::{Clip, FrameDims};

#[cfg(test)]
mod __tests__;
