//! # 모델 및 학습 구성
//!
//! 해상도, 채널 수, hidden 차원은 텐서 형상에서 추론하지 않고
//! 설정값으로 명시해서 세션 생성 시 한 번만 검증한다.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::curriculum::CurriculumConfig;
use super::error::{VideoError, VideoResult};
use super::optimizers::OptimizerConfig;
use super::types::FrameDims;

/// 인코더/ConvLSTM/디코더 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// 이미지 채널 수
    pub image_channels: usize,
    /// 잠재 공간(= LSTM hidden) 채널 수
    pub hidden_dim: usize,
    /// 인코더 중간 채널 수
    pub encoder_width: usize,
    /// 디코더 중간 채널 수
    pub decoder_width: usize,
    /// 2배 다운샘플링 단계 수 (stride = 2^levels)
    pub downsample_levels: usize,
    /// 합성곱 커널 크기 (홀수)
    pub kernel_size: usize,
    /// 기준 공간 해상도
    pub resolution: usize,
    /// LeakyReLU 음수 기울기
    pub leaky_slope: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            image_channels: 3,
            hidden_dim: 16,
            encoder_width: 8,
            decoder_width: 4,
            downsample_levels: 2,
            kernel_size: 3,
            resolution: 64,
            leaky_slope: 0.2,
        }
    }
}

impl ModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_image_channels(mut self, channels: usize) -> Self {
        self.image_channels = channels;
        self
    }

    pub fn with_downsample_levels(mut self, levels: usize) -> Self {
        self.downsample_levels = levels;
        self
    }

    /// 네트워크 전체 다운샘플링 배율
    pub fn stride(&self) -> usize {
        1 << self.downsample_levels
    }

    /// 기준 해상도에서의 잠재 공간 해상도
    pub fn latent_resolution(&self) -> usize {
        self.resolution / self.stride()
    }

    pub fn validate(&self) -> VideoResult<()> {
        let positive = [
            ("image_channels", self.image_channels),
            ("hidden_dim", self.hidden_dim),
            ("encoder_width", self.encoder_width),
            ("decoder_width", self.decoder_width),
            ("downsample_levels", self.downsample_levels),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(VideoError::invalid_config(format!("{} must be positive", name)));
            }
        }
        if self.downsample_levels > 8 {
            return Err(VideoError::invalid_config("downsample_levels must be at most 8"));
        }
        if self.kernel_size % 2 == 0 {
            return Err(VideoError::invalid_config(format!(
                "kernel_size must be odd, got {}",
                self.kernel_size
            )));
        }
        if !(0.0..1.0).contains(&self.leaky_slope) {
            return Err(VideoError::invalid_config("leaky_slope must be in [0, 1)"));
        }
        let stride = self.stride();
        if self.resolution == 0 || self.resolution % stride != 0 {
            return Err(VideoError::StrideMismatch {
                height: self.resolution,
                width: self.resolution,
                stride,
            });
        }
        Ok(())
    }

    /// 프레임 배치가 이 모델에 들어갈 수 있는지 검사
    pub fn check_frame(&self, dims: FrameDims) -> VideoResult<()> {
        let (_n, c, h, w) = dims;
        if c != self.image_channels {
            return Err(VideoError::shape_mismatch(
                format!("{} image channels", self.image_channels),
                format!("{} channels", c),
            ));
        }
        let stride = self.stride();
        if h == 0 || w == 0 || h % stride != 0 || w % stride != 0 {
            return Err(VideoError::StrideMismatch {
                height: h,
                width: w,
                stride,
            });
        }
        Ok(())
    }
}

/// 학습 세션 전체 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub model: ModelConfig,
    pub curriculum: CurriculumConfig,
    pub optimizer: OptimizerConfig,
    pub batch_size: usize,
    pub epochs: usize,
    pub iterations_per_epoch: usize,
    /// 클립 최대 길이 (초)
    pub max_clip_length: f64,
    pub fps: usize,
    /// n 프레임마다 하나만 사용
    pub skip_frames: usize,
    /// 외부 렌더링용 표시 프레임 수 (앞 절반 + 뒤 절반)
    pub num_display_frames: usize,
    /// 옵티마이저를 한 번 재시작할 반복 인덱스
    pub restart_iteration: Option<usize>,
    pub seed: u64,
    /// 랜덤 크롭 증강 사용 여부
    pub augmentation: bool,
    /// 비유한 손실이면 반복을 오류로 중단
    pub abort_on_non_finite: bool,
    pub checkpoint_dir: Option<PathBuf>,
    /// 체크포인트 저장 주기 (에포크, 0이면 저장 안 함)
    pub checkpoint_every: usize,
    pub use_cuda: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            curriculum: CurriculumConfig::default(),
            optimizer: OptimizerConfig::default(),
            batch_size: 1,
            epochs: 200,
            iterations_per_epoch: 50,
            max_clip_length: 2.0,
            fps: 30,
            skip_frames: 1,
            num_display_frames: 8,
            restart_iteration: Some(20),
            seed: 0,
            augmentation: true,
            abort_on_non_finite: false,
            checkpoint_dir: None,
            checkpoint_every: 10,
            use_cuda: false,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    pub fn with_curriculum(mut self, curriculum: CurriculumConfig) -> Self {
        self.curriculum = curriculum;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_clip_length(mut self, seconds: f64, fps: usize) -> Self {
        self.max_clip_length = seconds;
        self.fps = fps;
        self
    }

    pub fn with_restart_iteration(mut self, iteration: Option<usize>) -> Self {
        self.restart_iteration = iteration;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// 전체 호라이즌 `floor(max_clip_length * fps / skip_frames)`
    pub fn total_horizon(&self) -> usize {
        (self.max_clip_length * self.fps as f64 / self.skip_frames.max(1) as f64).floor() as usize
    }

    pub fn validate(&self) -> VideoResult<()> {
        self.model.validate()?;
        self.curriculum.validate()?;
        self.optimizer.validate()?;
        if self.batch_size == 0 {
            return Err(VideoError::invalid_config("batch_size must be positive"));
        }
        if self.skip_frames == 0 {
            return Err(VideoError::invalid_config("skip_frames must be positive"));
        }
        if !(self.max_clip_length > 0.0 && self.max_clip_length.is_finite()) {
            return Err(VideoError::invalid_config("max_clip_length must be positive"));
        }
        if self.total_horizon() == 0 {
            return Err(VideoError::DegenerateHorizon(0));
        }
        Ok(())
    }

    /// JSON 파일에서 읽기
    pub fn from_json_file(path: impl AsRef<Path>) -> VideoResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// JSON 파일로 쓰기
    pub fn save_json(&self, path: impl AsRef<Path>) -> VideoResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
