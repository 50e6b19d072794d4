//! 공용 합성곱 블록

use candle_core::{Result, Tensor};
use candle_nn::{Conv2d, Conv2dConfig, Module, VarBuilder};

/// 가장자리 복제 패딩 후 'same' 크기를 유지하는 2D 합성곱
#[derive(Debug, Clone)]
pub struct PaddedConv2d {
    conv: Conv2d,
    pad: usize,
}

impl PaddedConv2d {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let conv = candle_nn::conv2d(
            in_channels,
            out_channels,
            kernel_size,
            Conv2dConfig::default(),
            vb,
        )?;
        Ok(Self {
            conv,
            pad: kernel_size / 2,
        })
    }
}

impl Module for PaddedConv2d {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = if self.pad > 0 {
            xs.pad_with_same(2, self.pad, self.pad)?
                .pad_with_same(3, self.pad, self.pad)?
        } else {
            xs.clone()
        };
        self.conv.forward(&xs)
    }
}

/// 2배 최근접 업샘플링
pub fn upsample2x(xs: &Tensor) -> Result<Tensor> {
    let (_n, _c, h, w) = xs.dims4()?;
    xs.upsample_nearest2d(h * 2, w * 2)
}
