//! 비디오 합성 엔진 오류 타입
//!
//! 형상 오류와 호라이즌 오류는 즉시 호출자에게 전파되고,
//! 예측/타깃 길이 불일치는 오류가 아니라 학습 루프 내부에서 절단으로 처리된다.

use thiserror::Error;

/// 비디오 합성 결과 타입
pub type VideoResult<T> = Result<T, VideoError>;

#[derive(Debug, Error)]
pub enum VideoError {
    /// 텐서 연산 실패
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    /// 입력/상태/컨텍스트 형상 불일치
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// 해상도가 네트워크 다운샘플링 stride의 배수가 아님
    #[error("Resolution {height}x{width} is not divisible by network stride {stride}")]
    StrideMismatch {
        height: usize,
        width: usize,
        stride: usize,
    },

    /// 0 프레임 롤아웃 요청
    #[error("Degenerate horizon: {0} frames requested, at least 1 required")]
    DegenerateHorizon(usize),

    /// 비유한 손실 (strict 모드에서만 반환)
    #[error("Non-finite loss {value} at iteration {iteration}")]
    NonFiniteLoss { iteration: usize, value: f32 },

    /// 잘못된 설정값
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 체크포인트 저장/복원 실패
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl VideoError {
    pub fn shape_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn checkpoint(msg: impl Into<String>) -> Self {
        Self::Checkpoint(msg.into())
    }

    /// 반복을 중단시켜야 하는 구조적 오류인지 여부
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::ShapeMismatch { .. } | Self::StrideMismatch { .. } | Self::DegenerateHorizon(_)
        )
    }
}
