use serde::{Deserialize, Serialize};

use crate::core::error::{VideoError, VideoResult};

/// Optimizer 전체 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Adam 구성
    pub adam: AdamConfig,
    /// 학습률
    pub learning_rate: f64,
    /// 전역 노름 그래디언트 클리핑
    pub gradient_clipping: Option<f64>,
    /// 분리형 가중치 감소 (0이면 순수 Adam)
    pub weight_decay: f64,
}

/// Adam 옵티마이저 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    /// 베타1 파라미터 (1차 모멘트 지수 감소율)
    pub beta1: f64,
    /// 베타2 파라미터 (2차 모멘트 지수 감소율)
    pub beta2: f64,
    /// 엡실론 (수치 안정성을 위한 작은 값)
    pub epsilon: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            adam: AdamConfig::default(),
            learning_rate: 2e-4,
            gradient_clipping: None,
            weight_decay: 0.0,
        }
    }
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            beta1: 0.5,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl OptimizerConfig {
    /// 새 구성 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// Adam 구성 설정
    pub fn with_adam_config(mut self, config: AdamConfig) -> Self {
        self.adam = config;
        self
    }

    /// 학습률 설정
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// 그래디언트 클리핑 설정
    pub fn with_gradient_clipping(mut self, clip_value: Option<f64>) -> Self {
        self.gradient_clipping = clip_value;
        self
    }

    /// 가중치 감소 설정
    pub fn with_weight_decay(mut self, decay: f64) -> Self {
        self.weight_decay = decay;
        self
    }

    pub fn validate(&self) -> VideoResult<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(VideoError::invalid_config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for (name, beta) in [("beta1", self.adam.beta1), ("beta2", self.adam.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(VideoError::invalid_config(format!(
                    "{} must be in [0, 1), got {}",
                    name, beta
                )));
            }
        }
        if self.adam.epsilon <= 0.0 {
            return Err(VideoError::invalid_config("epsilon must be positive"));
        }
        if let Some(clip) = self.gradient_clipping {
            if clip <= 0.0 {
                return Err(VideoError::invalid_config("gradient_clipping must be positive"));
            }
        }
        if self.weight_decay < 0.0 {
            return Err(VideoError::invalid_config("weight_decay must be non-negative"));
        }
        Ok(())
    }
}
