//! # 순환 비디오 합성 모델
//!
//! 인코더 -> ConvLSTM (N 스텝) -> 스텝별 디코더

pub mod layers;
pub mod conv_lstm;
pub mod encoder;
pub mod decoder;
pub mod generator;

pub use conv_lstm::{ConvLstmCell, RecurrentState};
pub use decoder::FrameDecoder;
pub use encoder::FrameEncoder;
pub use generator::SequenceGenerator;
pub use layers::PaddedConv2d;

#[cfg(test)]
mod __tests__;
