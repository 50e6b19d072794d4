//! 단일 프레임 조건 비디오 합성 라이브러리
//!
//! 이미지 한 장을 잠재 공간으로 인코딩하고, 같은 컨텍스트를 매 스텝 다시 넣는 ConvLSTM 으로
//! 미래 프레임을 굴려 낸다. 학습은 에포크에 따라 길어지는 커리큘럼 호라이즌 위에서
//! 프레임별 L1 손실로 이루어진다.

pub mod core;
pub mod data;

pub use core::{
    // 설정
    CurriculumConfig, ModelConfig, OptimizerConfig, TrainingConfig,
    // 모델과 데이터 구조
    Clip, SequenceGenerator,
    // 학습
    EpochSummary, StepReport, TrainingSession,
    // 오류
    VideoError, VideoResult,
};
pub use data::{ClipSample, ClipSource, SyntheticClipSource};
