//! # 시퀀스 생성기
//!
//! 조건 프레임 하나를 인코딩해서 고정 컨텍스트를 만들고, ConvLSTM 을
//! `horizon - 1` 번 진행하면서 hidden 상태를 디코딩해 클립을 만든다.
//!
//! 롤아웃 단계:
//! 1. [0, 1] -> [-1, 1] 변환
//! 2. 컨텍스트 인코딩 (한 번만, 이후 변경 없음)
//! 3. (hidden, cell) 을 U(-1, 1) 로 초기화
//! 4. 슬롯 0 = 조건 프레임 그대로
//! 5. 스텝 1..horizon-1: 상태 업데이트 후 hidden 디코딩
//! 6. 전체 클립을 [0, 1] 로 되돌림

use candle_core::{Result as CandleResult, Tensor};
use candle_nn::{Module, VarBuilder};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use super::conv_lstm::{ConvLstmCell, RecurrentState};
use super::decoder::FrameDecoder;
use super::encoder::FrameEncoder;
use crate::core::config::ModelConfig;
use crate::core::error::{VideoError, VideoResult};
use crate::core::types::{as_frame_batch, to_signed_range, to_unit_range, Clip};

#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    encoder: FrameEncoder,
    cell: ConvLstmCell,
    decoder: FrameDecoder,
    config: ModelConfig,
}

impl SequenceGenerator {
    /// 파라미터는 `encoder.*`, `lstm.*`, `decoder.*` 이름으로 VarBuilder 에 등록된다
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> VideoResult<Self> {
        config.validate()?;
        let encoder = FrameEncoder::new(config, vb.pp("encoder"))?;
        let cell = ConvLstmCell::new(
            config.hidden_dim,
            config.hidden_dim,
            config.kernel_size,
            vb.pp("lstm"),
        )?;
        let decoder = FrameDecoder::new(config, vb.pp("decoder"))?;
        Ok(Self {
            encoder,
            cell,
            decoder,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn cell(&self) -> &ConvLstmCell {
        &self.cell
    }

    /// [-1, 1] 프레임을 컨텍스트 특징맵으로
    pub fn encode(&self, signed_frame: &Tensor) -> VideoResult<Tensor> {
        Ok(self.encoder.forward(signed_frame)?)
    }

    /// hidden 특징맵을 [-1, 1] 프레임으로
    pub fn decode(&self, hidden: &Tensor) -> VideoResult<Tensor> {
        Ok(self.decoder.forward(hidden)?)
    }

    /// 컨텍스트와 같은 형상의 U(-1, 1) 초기 상태
    pub fn initial_state<R: Rng + ?Sized>(
        &self,
        context: &Tensor,
        rng: &mut R,
    ) -> VideoResult<RecurrentState> {
        let dims = context.dims4()?;
        let (n, c, h, w) = dims;
        let count = n * c * h * w;
        let uniform = Uniform::new_inclusive(-1.0f32, 1.0f32);

        let hidden: Vec<f32> = (0..count).map(|_| uniform.sample(rng)).collect();
        let cell: Vec<f32> = (0..count).map(|_| uniform.sample(rng)).collect();

        let hidden = Tensor::from_vec(hidden, dims, context.device())?.to_dtype(context.dtype())?;
        let cell = Tensor::from_vec(cell, dims, context.device())?.to_dtype(context.dtype())?;
        RecurrentState::new(hidden, cell)
    }

    /// 조건 프레임에서 `horizon` 프레임 클립 생성
    ///
    /// 입력은 `(C, H, W)` 또는 `(N, C, H, W)`, 값 범위 [0, 1].
    /// 반환 클립의 프레임 0 은 입력 프레임이다.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        initial_frame: &Tensor,
        horizon: usize,
        rng: &mut R,
    ) -> VideoResult<Clip> {
        if horizon == 0 {
            return Err(VideoError::DegenerateHorizon(horizon));
        }
        let frame = as_frame_batch(initial_frame)?;
        self.config.check_frame(frame.dims4()?)?;

        let signed = to_signed_range(&frame)?;
        let mut outputs = Vec::with_capacity(horizon);
        outputs.push(signed.clone());

        if horizon > 1 {
            let context = self.encode(&signed)?;
            let mut state = self.initial_state(&context, rng)?;
            for _ in 1..horizon {
                state = self.cell.step(&context, state)?;
                outputs.push(self.decode(&state.hidden)?);
            }
        }

        let frames = outputs
            .iter()
            .map(to_unit_range)
            .collect::<CandleResult<Vec<_>>>()?;
        Clip::new(frames)
    }
}
