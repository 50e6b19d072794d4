use candle_core::{Result, Tensor};
use candle_nn::{Module, VarBuilder};

use super::layers::{upsample2x, PaddedConv2d};
use crate::core::config::ModelConfig;

/// 프레임 디코더
///
/// 인코더의 대칭 구조. 단계마다 2배 업샘플링 -> 합성곱,
/// 중간 단계는 LeakyReLU, 마지막 단계는 tanh 로 [-1, 1] 출력.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    blocks: Vec<PaddedConv2d>,
    leaky_slope: f64,
}

impl FrameDecoder {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let levels = config.downsample_levels;
        let mut blocks = Vec::with_capacity(levels);
        let mut in_channels = config.hidden_dim;
        for level in 0..levels {
            let out_channels = if level + 1 == levels {
                config.image_channels
            } else {
                config.decoder_width
            };
            blocks.push(PaddedConv2d::new(
                in_channels,
                out_channels,
                config.kernel_size,
                vb.pp(format!("conv{}", level)),
            )?);
            in_channels = out_channels;
        }
        Ok(Self {
            blocks,
            leaky_slope: config.leaky_slope,
        })
    }
}

impl Module for FrameDecoder {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let last = self.blocks.len().saturating_sub(1);
        let mut xs = xs.clone();
        for (index, block) in self.blocks.iter().enumerate() {
            xs = upsample2x(&xs)?;
            xs = block.forward(&xs)?;
            xs = if index == last {
                xs.tanh()?
            } else {
                candle_nn::ops::leaky_relu(&xs, self.leaky_slope)?
            };
        }
        Ok(xs)
    }
}
