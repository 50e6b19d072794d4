//! # 합성곱 LSTM 셀
//!
//! 입력 특징맵과 (hidden, cell) 상태를 받아 새 상태를 만든다.
//! 입력과 이전 hidden을 채널축으로 이어 붙인 뒤 하나의 합성곱으로
//! 입력/망각/출력 게이트와 후보 업데이트를 한 번에 계산한다.

use candle_core::Tensor;
use candle_nn::{Module, VarBuilder};

use super::layers::PaddedConv2d;
use crate::core::error::{VideoError, VideoResult};

/// 순환 상태 (hidden, cell)
///
/// 롤아웃마다 새로 만들어지고 롤아웃이 끝나면 버려진다.
#[derive(Debug, Clone)]
pub struct RecurrentState {
    pub hidden: Tensor,
    pub cell: Tensor,
}

impl RecurrentState {
    pub fn new(hidden: Tensor, cell: Tensor) -> VideoResult<Self> {
        if hidden.dims() != cell.dims() {
            return Err(VideoError::shape_mismatch(
                format!("cell {:?}", hidden.dims()),
                format!("{:?}", cell.dims()),
            ));
        }
        Ok(Self { hidden, cell })
    }
}

#[derive(Debug, Clone)]
pub struct ConvLstmCell {
    gates: PaddedConv2d,
    input_channels: usize,
    hidden_channels: usize,
}

impl ConvLstmCell {
    pub fn new(
        input_channels: usize,
        hidden_channels: usize,
        kernel_size: usize,
        vb: VarBuilder,
    ) -> VideoResult<Self> {
        let gates = PaddedConv2d::new(
            input_channels + hidden_channels,
            4 * hidden_channels,
            kernel_size,
            vb.pp("gates"),
        )?;
        Ok(Self {
            gates,
            input_channels,
            hidden_channels,
        })
    }

    pub fn hidden_channels(&self) -> usize {
        self.hidden_channels
    }

    /// 한 스텝 진행
    ///
    /// 상태가 이 셀의 직전 출력일 필요는 없다. 생성기는 매 스텝 같은
    /// 컨텍스트를 입력으로 다시 넣고 상태만 순환 업데이트로 진화시킨다.
    pub fn step(&self, input: &Tensor, state: RecurrentState) -> VideoResult<RecurrentState> {
        self.check_shapes(input, &state)?;

        let combined = Tensor::cat(&[input, &state.hidden], 1)?;
        let gates = self.gates.forward(&combined)?;
        let chunks = gates.chunk(4, 1)?;

        let input_gate = candle_nn::ops::sigmoid(&chunks[0])?;
        let forget_gate = candle_nn::ops::sigmoid(&chunks[1])?;
        let output_gate = candle_nn::ops::sigmoid(&chunks[2])?;
        let candidate = chunks[3].tanh()?;

        let cell = forget_gate
            .mul(&state.cell)?
            .add(&input_gate.mul(&candidate)?)?;
        let hidden = output_gate.mul(&cell.tanh()?)?;

        Ok(RecurrentState { hidden, cell })
    }

    fn check_shapes(&self, input: &Tensor, state: &RecurrentState) -> VideoResult<()> {
        let (n, c, h, w) = input.dims4()?;
        if c != self.input_channels {
            return Err(VideoError::shape_mismatch(
                format!("{} input channels", self.input_channels),
                format!("{}", c),
            ));
        }
        let expected = [n, self.hidden_channels, h, w];
        for (name, tensor) in [("hidden", &state.hidden), ("cell", &state.cell)] {
            if tensor.dims() != expected.as_slice() {
                return Err(VideoError::shape_mismatch(
                    format!("{} {:?}", name, expected),
                    format!("{:?}", tensor.dims()),
                ));
            }
        }
        Ok(())
    }
}
