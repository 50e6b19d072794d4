//! # 프레임별 L1 손실
//!
//! 프레임 0 은 조건 프레임을 그대로 복사한 것이므로 손실에서 제외한다.

use candle_core::{DType, Tensor};
use serde::{Deserialize, Serialize};

use crate::core::error::{VideoError, VideoResult};
use crate::core::types::Clip;

/// (프레임 인덱스, 손실) 한 점
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossPoint {
    pub frame_index: usize,
    pub loss: f32,
}

/// 가장 최근 클립의 프레임별 손실 곡선
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossTrace {
    points: Vec<LossPoint>,
}

impl LossTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame_index: usize, loss: f32) {
        self.points.push(LossPoint { frame_index, loss });
    }

    pub fn points(&self) -> &[LossPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 플롯용 x 축 (프레임 인덱스)
    pub fn x(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.frame_index).collect()
    }

    /// 플롯용 y 축 (손실)
    pub fn y(&self) -> Vec<f32> {
        self.points.iter().map(|p| p.loss).collect()
    }

    pub fn mean(&self) -> Option<f32> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().map(|p| p.loss).sum::<f32>() / self.points.len() as f32)
    }

    /// 마지막 n 개 점
    pub fn tail(&self, n: usize) -> &[LossPoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }
}

/// 실제로 지도되는 길이 `min(예측 길이, 타깃 길이, 호라이즌)`
pub fn supervised_length(predicted_len: usize, target_len: usize, horizon: usize) -> usize {
    predicted_len.min(target_len).min(horizon)
}

/// 두 프레임 배치 간 평균 절대 오차
pub fn frame_l1(predicted: &Tensor, target: &Tensor) -> VideoResult<Tensor> {
    if predicted.dims() != target.dims() {
        return Err(VideoError::shape_mismatch(
            format!("{:?}", predicted.dims()),
            format!("target {:?}", target.dims()),
        ));
    }
    Ok(predicted.sub(target)?.abs()?.mean_all()?)
}

/// 클립 손실 계산 결과
#[derive(Debug, Clone)]
pub struct ClipLoss {
    /// 역전파 가능한 스칼라 손실
    pub loss: Tensor,
    pub trace: LossTrace,
    pub supervised_len: usize,
}

impl ClipLoss {
    pub fn value(&self) -> VideoResult<f32> {
        Ok(self.loss.to_dtype(DType::F32)?.to_scalar::<f32>()?)
    }
}

/// 프레임 1..T-1 의 L1 합을 T 로 나눈 손실
///
/// 길이 불일치는 오류가 아니다. 짧은 쪽에 맞춰 절단한다.
pub fn clip_l1_loss(predicted: &Clip, target: &Clip, horizon: usize) -> VideoResult<ClipLoss> {
    let supervised_len = supervised_length(predicted.len(), target.len(), horizon);
    let reference = match (predicted.frame(0), supervised_len) {
        (Some(frame), len) if len > 0 => frame,
        _ => return Err(VideoError::DegenerateHorizon(supervised_len)),
    };

    let mut trace = LossTrace::new();
    let mut total = Tensor::zeros((), reference.dtype(), reference.device())?;
    for index in 1..supervised_len {
        let (Some(p), Some(t)) = (predicted.frame(index), target.frame(index)) else {
            break;
        };
        let frame_loss = frame_l1(p, t)?;
        trace.push(index, frame_loss.to_dtype(DType::F32)?.to_scalar::<f32>()?);
        total = total.add(&frame_loss)?;
    }

    let loss = total.affine(1.0 / supervised_len as f64, 0.0)?;
    Ok(ClipLoss {
        loss,
        trace,
        supervised_len,
    })
}
