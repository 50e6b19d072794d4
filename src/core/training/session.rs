//! # 학습 세션
//!
//! 파라미터, 옵티마이저, 반복 카운터, 재시작 플래그, 최근 손실 곡선과 예측 클립을
//! 하나의 소유자 아래 묶는다. 전역 가변 상태는 없다.

use candle_core::{DType, Device, Tensor};
use candle_nn::{Optimizer, VarBuilder, VarMap};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::display::{display_frames, DisplayFrame};
use super::loss::{clip_l1_loss, ClipLoss, LossTrace};
use crate::core::config::TrainingConfig;
use crate::core::error::{VideoError, VideoResult};
use crate::core::model::SequenceGenerator;
use crate::core::optimizers::AdamOptimizer;
use crate::core::types::Clip;
use crate::data::{ClipSample, ClipSource};

/// `use_cuda` 이면 CUDA 0 번, 실패하면 CPU
pub fn select_device(use_cuda: bool) -> Device {
    if !use_cuda {
        return Device::Cpu;
    }
    match Device::new_cuda(0) {
        Ok(device) => {
            info!("CUDA 장치 0 사용");
            device
        }
        Err(e) => {
            warn!("CUDA 장치를 열 수 없어 CPU 로 대체: {}", e);
            Device::Cpu
        }
    }
}

/// 반복 한 번의 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub iteration: usize,
    pub epoch: usize,
    pub horizon: usize,
    /// 손실에 들어간 프레임 수 T
    pub supervised_len: usize,
    pub loss: f32,
    /// 이번 반복에서 옵티마이저가 재시작되었는지
    pub restarted: bool,
    pub optimizer_generation: usize,
}

/// 에포크 요약
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: usize,
    pub horizon: usize,
    pub steps: usize,
    pub mean_loss: f32,
    pub last_loss: f32,
    pub non_finite_steps: usize,
}

const EVAL_SEED_MASK: u64 = 0x5EED_E7A1_0000_0001;

pub struct TrainingSession {
    config: TrainingConfig,
    device: Device,
    var_map: VarMap,
    generator: SequenceGenerator,
    optimizer: AdamOptimizer,
    optimizer_generation: usize,
    optimizer_restarted: bool,
    /// 세션 전체에서 0 부터 세는 반복 카운터
    iteration: usize,
    epoch: usize,
    loss_trace: LossTrace,
    predicted: Option<Clip>,
    rng: StdRng,
    /// `predict`/`evaluate` 전용 난수. 학습 난수열을 건드리지 않는다
    eval_rng: StdRng,
}

impl TrainingSession {
    pub fn new(config: TrainingConfig) -> VideoResult<Self> {
        let device = select_device(config.use_cuda);
        Self::with_device(config, device)
    }

    pub fn with_device(config: TrainingConfig, device: Device) -> VideoResult<Self> {
        config.validate()?;
        let var_map = VarMap::new();
        let vb = VarBuilder::from_varmap(&var_map, DType::F32, &device);
        let generator = SequenceGenerator::new(&config.model, vb)?;
        let optimizer = AdamOptimizer::new(var_map.all_vars(), config.optimizer.clone())?;
        let rng = StdRng::seed_from_u64(config.seed);
        let eval_rng = StdRng::seed_from_u64(config.seed ^ EVAL_SEED_MASK);

        let session = Self {
            config,
            device,
            var_map,
            generator,
            optimizer,
            optimizer_generation: 0,
            optimizer_restarted: false,
            iteration: 0,
            epoch: 0,
            loss_trace: LossTrace::new(),
            predicted: None,
            rng,
            eval_rng,
        };
        info!(
            "학습 세션 생성: 파라미터 텐서 {}개 ({} 원소), 전체 호라이즌 {}",
            session.optimizer.num_params(),
            session.parameter_count(),
            session.total_horizon()
        );
        Ok(session)
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn var_map(&self) -> &VarMap {
        &self.var_map
    }

    pub(crate) fn var_map_mut(&mut self) -> &mut VarMap {
        &mut self.var_map
    }

    pub fn generator(&self) -> &SequenceGenerator {
        &self.generator
    }

    pub fn optimizer(&self) -> &AdamOptimizer {
        &self.optimizer
    }

    pub(crate) fn replace_optimizer(&mut self, optimizer: AdamOptimizer) {
        self.optimizer = optimizer;
    }

    /// 옵티마이저가 새로 만들어진 횟수
    pub fn optimizer_generation(&self) -> usize {
        self.optimizer_generation
    }

    pub fn optimizer_restarted(&self) -> bool {
        self.optimizer_restarted
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// 마지막으로 학습한 에포크
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// 이어서 학습할 에포크
    pub fn resume_epoch(&self) -> usize {
        if self.iteration == 0 {
            0
        } else {
            self.epoch + 1
        }
    }

    pub(crate) fn restore_counters(
        &mut self,
        epoch: usize,
        iteration: usize,
        optimizer_generation: usize,
        optimizer_restarted: bool,
    ) {
        self.epoch = epoch;
        self.iteration = iteration;
        self.optimizer_generation = optimizer_generation;
        self.optimizer_restarted = optimizer_restarted;
    }

    #[cfg(test)]
    pub(crate) fn training_rng(&self) -> &StdRng {
        &self.rng
    }

    pub fn loss_trace(&self) -> &LossTrace {
        &self.loss_trace
    }

    /// 가장 최근 반복의 예측 클립 (그래프에서 분리됨)
    pub fn predicted_clip(&self) -> Option<&Clip> {
        self.predicted.as_ref()
    }

    pub fn total_horizon(&self) -> usize {
        self.config.total_horizon()
    }

    pub fn horizon_for(&self, epoch: usize) -> usize {
        self.config
            .curriculum
            .horizon_for(epoch, self.total_horizon())
    }

    /// 학습 가능한 원소 수
    pub fn parameter_count(&self) -> usize {
        self.var_map
            .all_vars()
            .iter()
            .map(|v| v.as_tensor().elem_count())
            .sum()
    }

    fn should_restart(&self) -> bool {
        match self.config.restart_iteration {
            Some(at) => !self.optimizer_restarted && self.iteration >= at,
            None => false,
        }
    }

    /// 같은 파라미터, 같은 하이퍼파라미터로 옵티마이저를 새로 만든다 (모멘트 초기화)
    pub fn restart_optimizer(&mut self) -> VideoResult<()> {
        self.optimizer =
            AdamOptimizer::new(self.var_map.all_vars(), self.config.optimizer.clone())?;
        self.optimizer_generation += 1;
        self.optimizer_restarted = true;
        info!(
            "반복 {} 에서 옵티마이저 재시작 (세대 {})",
            self.iteration, self.optimizer_generation
        );
        Ok(())
    }

    /// 그래디언트 없이 예측만 수행
    pub fn predict(&mut self, conditioning_frame: &Tensor, horizon: usize) -> VideoResult<Clip> {
        let frame = conditioning_frame.to_device(&self.device)?;
        let clip = self.generator.generate(&frame, horizon, &mut self.eval_rng)?;
        clip.map_frames(|f| Ok(f.detach()))
    }

    /// 파라미터를 바꾸지 않고 손실만 계산
    pub fn evaluate(&mut self, epoch: usize, sample: &ClipSample) -> VideoResult<ClipLoss> {
        let sample = sample.to_device(&self.device)?;
        let horizon = self.horizon_for(epoch);
        let predicted = self
            .generator
            .generate(&sample.conditioning_frame, horizon, &mut self.eval_rng)?;
        clip_l1_loss(&predicted, &sample.target_clip, horizon)
    }

    /// 학습 반복 한 번
    ///
    /// 호라이즌 결정 -> 롤아웃 -> 손실 -> (필요시) 옵티마이저 재시작 -> 역전파 -> 업데이트.
    /// 재시작은 손실 검사를 통과한 반복에서만 일어난다.
    /// candle 의 `backward` 는 매번 새 그래디언트 저장소를 만들기 때문에 따로 지울 누적값이 없다.
    pub fn train_step(&mut self, epoch: usize, sample: &ClipSample) -> VideoResult<StepReport> {
        if sample.target_clip.is_empty() {
            return Err(VideoError::shape_mismatch(
                "target clip with at least 1 frame",
                "0 frames",
            ));
        }
        let sample = sample.to_device(&self.device)?;
        let horizon = self.horizon_for(epoch);
        let predicted = self
            .generator
            .generate(&sample.conditioning_frame, horizon, &mut self.rng)?;

        let clip_loss = clip_l1_loss(&predicted, &sample.target_clip, horizon)?;
        let loss = clip_loss.value()?;
        if !loss.is_finite() {
            if self.config.abort_on_non_finite {
                return Err(VideoError::NonFiniteLoss {
                    iteration: self.iteration,
                    value: loss,
                });
            }
            warn!("반복 {} 에서 비유한 손실 {}", self.iteration, loss);
        }

        let restarted = if self.should_restart() {
            self.restart_optimizer()?;
            true
        } else {
            false
        };

        self.optimizer.backward_step(&clip_loss.loss)?;

        let report = StepReport {
            iteration: self.iteration,
            epoch,
            horizon,
            supervised_len: clip_loss.supervised_len,
            loss,
            restarted,
            optimizer_generation: self.optimizer_generation,
        };
        debug!(
            "epoch {} iter {}: horizon {} T {} loss {:.6}",
            epoch, self.iteration, horizon, clip_loss.supervised_len, loss
        );

        self.loss_trace = clip_loss.trace;
        self.predicted = Some(predicted.map_frames(|f| Ok(f.detach()))?);
        self.epoch = epoch;
        self.iteration += 1;
        Ok(report)
    }

    /// `iterations_per_epoch` 번 반복하고 요약을 돌려준다
    pub fn train_epoch<S, F>(
        &mut self,
        epoch: usize,
        source: &mut S,
        mut on_step: F,
    ) -> VideoResult<EpochSummary>
    where
        S: ClipSource + ?Sized,
        F: FnMut(&StepReport),
    {
        let horizon = self.horizon_for(epoch);
        let mut total = 0.0f64;
        let mut finite_steps = 0usize;
        let mut non_finite_steps = 0usize;
        let mut last_loss = f32::NAN;

        for _ in 0..self.config.iterations_per_epoch {
            let sample = source.next_sample()?;
            let report = self.train_step(epoch, &sample)?;
            if report.loss.is_finite() {
                total += report.loss as f64;
                finite_steps += 1;
            } else {
                non_finite_steps += 1;
            }
            last_loss = report.loss;
            on_step(&report);
        }

        let mean_loss = if finite_steps > 0 {
            (total / finite_steps as f64) as f32
        } else {
            f32::NAN
        };
        let summary = EpochSummary {
            epoch,
            horizon,
            steps: self.config.iterations_per_epoch,
            mean_loss,
            last_loss,
            non_finite_steps,
        };
        info!(
            "epoch {} 완료: horizon {}, 평균 손실 {:.6}",
            epoch, horizon, summary.mean_loss
        );
        Ok(summary)
    }

    /// 최근 예측 클립의 표시 슬롯
    pub fn display_frames(&self) -> Vec<DisplayFrame> {
        match &self.predicted {
            Some(clip) => display_frames(clip, self.config.num_display_frames),
            None => Vec::new(),
        }
    }
}
