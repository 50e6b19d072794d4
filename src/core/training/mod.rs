//! # 학습 루프
//!
//! 커리큘럼 호라이즌으로 롤아웃하고, 프레임별 L1 손실로 한 스텝씩 업데이트한다.

pub mod checkpoint;
pub mod display;
pub mod loss;
pub mod session;

pub use checkpoint::{latest_checkpoint, SessionMeta};
pub use display::{display_frames, display_indices, to_byte_video, DisplayFrame};
pub use loss::{clip_l1_loss, frame_l1, supervised_length, ClipLoss, LossPoint, LossTrace};
pub use session::{select_device, EpochSummary, StepReport, TrainingSession};

#[cfg(test)]
mod __tests__;
