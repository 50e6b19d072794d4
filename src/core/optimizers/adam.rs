use std::collections::HashMap;

use candle_core::backprop::GradStore;
use candle_core::{Result, Tensor, Var};
use candle_nn::Optimizer;

use super::config::OptimizerConfig;

/// 파라미터 하나의 Adam 상태
#[derive(Debug)]
pub struct AdamState {
    pub var: Var,
    pub m: Tensor, // 1차 모멘트
    pub v: Tensor, // 2차 모멘트
}

impl AdamState {
    pub fn new(var: Var) -> Result<Self> {
        let m = var.as_tensor().zeros_like()?;
        let v = var.as_tensor().zeros_like()?;
        Ok(Self { var, m, v })
    }

    /// Adam 업데이트 수행 (`t` 는 1부터 시작하는 전역 스텝)
    pub fn update(&mut self, gradient: &Tensor, t: usize, config: &OptimizerConfig) -> Result<()> {
        let beta1 = config.adam.beta1;
        let beta2 = config.adam.beta2;
        let lr = config.learning_rate;

        // 모멘텀 업데이트
        let m = self
            .m
            .affine(beta1, 0.0)?
            .add(&gradient.affine(1.0 - beta1, 0.0)?)?;
        let v = self
            .v
            .affine(beta2, 0.0)?
            .add(&gradient.sqr()?.affine(1.0 - beta2, 0.0)?)?;

        // 편향 보정
        let m_hat = m.affine(1.0 / (1.0 - beta1.powi(t as i32)), 0.0)?;
        let v_hat = v.affine(1.0 / (1.0 - beta2.powi(t as i32)), 0.0)?;

        // 파라미터 업데이트
        let step = m_hat.div(&v_hat.sqrt()?.affine(1.0, config.adam.epsilon)?)?;
        let current = self.var.as_tensor();
        let mut next = current.sub(&step.affine(lr, 0.0)?)?;
        if config.weight_decay > 0.0 {
            next = next.sub(&current.affine(lr * config.weight_decay, 0.0)?)?;
        }

        self.var.set(&next.detach())?;
        self.m = m.detach();
        self.v = v.detach();
        Ok(())
    }
}

/// 텐서 단위 Adam 옵티마이저
///
/// 모멘트를 외부에 노출해서 체크포인트로 저장/복원할 수 있다.
/// 재시작은 이 객체를 통째로 새로 만드는 방식으로만 이루어진다.
#[derive(Debug)]
pub struct AdamOptimizer {
    states: Vec<AdamState>,
    t: usize,
    config: OptimizerConfig,
}

impl AdamOptimizer {
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// 지금까지 수행한 업데이트 횟수
    pub fn step_count(&self) -> usize {
        self.t
    }

    pub fn num_params(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[AdamState] {
        &self.states
    }

    /// 추적 중인 파라미터 전체의 그래디언트 L2 노름
    pub fn gradient_norm(&self, grads: &GradStore) -> Result<f64> {
        let mut total_sq = 0.0f64;
        for state in &self.states {
            if let Some(grad) = grads.get(state.var.as_tensor()) {
                let sq: f32 = grad.sqr()?.sum_all()?.to_scalar()?;
                total_sq += sq as f64;
            }
        }
        Ok(total_sq.sqrt())
    }

    /// 이름 -> 모멘트 텐서 (`<name>.m`, `<name>.v`)
    pub fn export_moments(&self, named_vars: &HashMap<String, Var>) -> HashMap<String, Tensor> {
        let mut tensors = HashMap::new();
        for (name, var) in named_vars {
            let id = var.as_tensor().id();
            if let Some(state) = self.states.iter().find(|s| s.var.as_tensor().id() == id) {
                tensors.insert(format!("{}.m", name), state.m.clone());
                tensors.insert(format!("{}.v", name), state.v.clone());
            }
        }
        tensors
    }

    /// `export_moments` 로 저장한 모멘트와 스텝 카운터 복원
    pub fn import_moments(
        &mut self,
        named_vars: &HashMap<String, Var>,
        tensors: &HashMap<String, Tensor>,
        step_count: usize,
    ) -> Result<()> {
        for (name, var) in named_vars {
            let id = var.as_tensor().id();
            let Some(state) = self.states.iter_mut().find(|s| s.var.as_tensor().id() == id) else {
                continue;
            };
            let (Some(m), Some(v)) = (
                tensors.get(&format!("{}.m", name)),
                tensors.get(&format!("{}.v", name)),
            ) else {
                candle_core::bail!("missing optimizer moments for parameter {}", name)
            };
            if m.dims() != state.m.dims() || v.dims() != state.v.dims() {
                candle_core::bail!(
                    "moment shape mismatch for {}: expected {:?}, got {:?}",
                    name,
                    state.m.dims(),
                    m.dims()
                )
            }
            state.m = m.to_device(state.var.device())?.to_dtype(state.var.dtype())?;
            state.v = v.to_device(state.var.device())?.to_dtype(state.var.dtype())?;
        }
        self.t = step_count;
        Ok(())
    }
}

impl Optimizer for AdamOptimizer {
    type Config = OptimizerConfig;

    fn new(vars: Vec<Var>, config: OptimizerConfig) -> Result<Self> {
        let states = vars
            .into_iter()
            .filter(|var| var.dtype().is_float())
            .map(AdamState::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            states,
            t: 0,
            config,
        })
    }

    fn step(&mut self, grads: &GradStore) -> Result<()> {
        let clip_scale = match self.config.gradient_clipping {
            Some(max_norm) => {
                let norm = self.gradient_norm(grads)?;
                if norm > max_norm {
                    max_norm / (norm + 1e-6)
                } else {
                    1.0
                }
            }
            None => 1.0,
        };

        self.t += 1;
        let t = self.t;
        let config = &self.config;
        for state in self.states.iter_mut() {
            // 그래디언트가 없는 파라미터는 건너뜀
            let Some(grad) = grads.get(state.var.as_tensor()) else {
                continue;
            };
            if clip_scale < 1.0 {
                state.update(&grad.affine(clip_scale, 0.0)?, t, config)?;
            } else {
                state.update(grad, t, config)?;
            }
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.config.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.config.learning_rate = lr;
    }
}
