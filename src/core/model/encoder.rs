use candle_core::{Result, Tensor};
use candle_nn::{Module, VarBuilder};

use super::layers::PaddedConv2d;
use crate::core::config::ModelConfig;

/// 프레임 인코더
///
/// 단계마다 합성곱 -> LeakyReLU -> 2x2 평균 풀링. 마지막 단계에서
/// 채널 수가 hidden 차원이 된다. 상태가 없으므로 롤아웃 전체에서 공유된다.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    blocks: Vec<PaddedConv2d>,
    leaky_slope: f64,
}

impl FrameEncoder {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let levels = config.downsample_levels;
        let mut blocks = Vec::with_capacity(levels);
        let mut in_channels = config.image_channels;
        for level in 0..levels {
            let out_channels = if level + 1 == levels {
                config.hidden_dim
            } else {
                config.encoder_width
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

impl Module for FrameEncoder {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.clone();
        for block in &self.blocks {
            xs = block.forward(&xs)?;
            xs = candle_nn::ops::leaky_relu(&xs, self.leaky_slope)?;
            xs = xs.avg_pool2d(2)?;
        }
        Ok(xs)
    }
}
