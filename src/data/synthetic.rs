//! # 합성 클립 공급자
//!
//! 배경 위를 튕기며 움직이는 사각형 클립을 시드 기반으로 생성한다.
//! 배치 안의 샘플들은 서로 독립이므로 rayon 으로 병렬 렌더링한다.

use candle_core::{Device, Tensor};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::augment::RandomCrop;
use super::window::{clip_from_frames, ClipWindow};
use super::{ClipSample, ClipSource};
use crate::core::config::TrainingConfig;
use crate::core::error::{VideoError, VideoResult};

/// 사각형 하나의 운동 파라미터
#[derive(Debug, Clone)]
struct MovingSquare {
    size: usize,
    origin: (f64, f64),
    velocity: (f64, f64),
    color: Vec<f32>,
    background: f32,
}

impl MovingSquare {
    fn random<R: Rng + ?Sized>(resolution: usize, channels: usize, rng: &mut R) -> Self {
        let size = rng.gen_range((resolution / 8).max(1)..=(resolution / 3).max(1));
        let room = (resolution - size) as f64;
        // 초당 픽셀
        let speed = resolution as f64 * 0.5;
        Self {
            size,
            origin: (rng.gen_range(0.0..=room), rng.gen_range(0.0..=room)),
            velocity: (rng.gen_range(-speed..=speed), rng.gen_range(-speed..=speed)),
            color: (0..channels).map(|_| rng.gen_range(0.5f32..=1.0)).collect(),
            background: rng.gen_range(0.0f32..=0.2),
        }
    }

    /// 벽에서 반사되는 좌표
    fn bounce(position: f64, room: f64) -> f64 {
        if room <= 0.0 {
            return 0.0;
        }
        let period = 2.0 * room;
        let m = position.rem_euclid(period);
        if m > room {
            period - m
        } else {
            m
        }
    }

    /// `(C, H, W)` 평탄화 픽셀
    fn render(&self, time: f64, resolution: usize) -> Vec<f32> {
        let room = (resolution - self.size) as f64;
        let y0 = Self::bounce(self.origin.0 + self.velocity.0 * time, room).round() as usize;
        let x0 = Self::bounce(self.origin.1 + self.velocity.1 * time, room).round() as usize;
        let plane = resolution * resolution;
        let mut pixels = vec![self.background; self.color.len() * plane];
        for (c, &value) in self.color.iter().enumerate() {
            for y in y0..(y0 + self.size).min(resolution) {
                let row = c * plane + y * resolution;
                for x in x0..(x0 + self.size).min(resolution) {
                    pixels[row + x] = value;
                }
            }
        }
        pixels
    }
}

pub struct SyntheticClipSource {
    rng: StdRng,
    device: Device,
    batch_size: usize,
    channels: usize,
    resolution: usize,
    fps: usize,
    skip_frames: usize,
    max_clip_length: f64,
    /// 합성 원본 비디오 길이 (초)
    source_length: f64,
    total_horizon: usize,
    crop: RandomCrop,
}

impl SyntheticClipSource {
    pub fn new(config: &TrainingConfig, device: Device) -> VideoResult<Self> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed.wrapping_add(1)),
            device,
            batch_size: config.batch_size,
            channels: config.model.image_channels,
            resolution: config.model.resolution,
            fps: config.fps,
            skip_frames: config.skip_frames,
            max_clip_length: config.max_clip_length,
            source_length: config.max_clip_length * 1.5,
            total_horizon: config.total_horizon(),
            crop: RandomCrop::new(config.model.stride(), config.augmentation),
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// 샘플 하나 생성: 창 선택 -> 렌더링 -> 솎아내기 -> 크롭 -> 절단
    pub fn generate(&mut self) -> VideoResult<ClipSample> {
        let window = ClipWindow::sample(
            0.0,
            self.source_length,
            self.max_clip_length,
            &mut self.rng,
        )?;
        let times = window.frame_times(self.fps);
        if times.is_empty() {
            return Err(VideoError::DegenerateHorizon(0));
        }

        let squares: Vec<MovingSquare> = (0..self.batch_size)
            .map(|_| MovingSquare::random(self.resolution, self.channels, &mut self.rng))
            .collect();

        let resolution = self.resolution;
        // [샘플][시각] -> 픽셀
        let rendered: Vec<Vec<Vec<f32>>> = squares
            .par_iter()
            .map(|square| {
                times
                    .iter()
                    .map(|&t| square.render(t, resolution))
                    .collect()
            })
            .collect();

        let frames = (0..times.len())
            .map(|t| {
                let data: Vec<f32> = rendered
                    .iter()
                    .flat_map(|sample| sample[t].iter().copied())
                    .collect();
                Tensor::from_vec(
                    data,
                    (self.batch_size, self.channels, resolution, resolution),
                    &self.device,
                )
            })
            .collect::<candle_core::Result<Vec<_>>>()?;

        let clip = clip_from_frames(&frames, self.skip_frames)?;
        let clip = self.crop.apply(&clip, &mut self.rng)?;
        debug!(
            "합성 샘플: 창 [{:.2}, {:.2}]s, {} 프레임",
            window.start,
            window.end,
            clip.len()
        );
        Ok(ClipSample::from_target(clip)?.truncate_target(self.total_horizon))
    }
}

impl ClipSource for SyntheticClipSource {
    fn next_sample(&mut self) -> VideoResult<ClipSample> {
        self.generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModelConfig;

    fn config() -> TrainingConfig {
        TrainingConfig::new()
            .with_model(ModelConfig::new().with_resolution(16))
            .with_clip_length(0.5, 20)
            .with_batch_size(3)
    }

    #[test]
    fn 샘플_형상_테스트() -> VideoResult<()> {
        let mut source = SyntheticClipSource::new(&config(), Device::Cpu)?;
        let sample = source.next_sample()?;

        assert_eq!(sample.target_clip.len(), 10);
        let (n, c, h, w) = sample.target_clip.frame_dims()?.expect("frames");
        assert_eq!((n, c), (3, 3));
        assert!(h % 4 == 0 && w % 4 == 0 && h <= 16 && w <= 16);
        assert_eq!(sample.conditioning_frame.dims4()?, (n, c, h, w));

        let values = sample.target_clip.to_tensor()?.flatten_all()?.to_vec1::<f32>()?;
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        Ok(())
    }

    #[test]
    fn 시드_재현성_테스트() -> VideoResult<()> {
        let mut config = config();
        config.augmentation = false;
        let a = SyntheticClipSource::new(&config, Device::Cpu)?.next_sample()?;
        let b = SyntheticClipSource::new(&config, Device::Cpu)?.next_sample()?;
        let diff: f32 = a
            .target_clip
            .to_tensor()?
            .sub(&b.target_clip.to_tensor()?)?
            .abs()?
            .sum_all()?
            .to_scalar()?;
        assert_eq!(diff, 0.0);
        Ok(())
    }

    #[test]
    fn 프레임_솎아내기_반영() -> VideoResult<()> {
        let mut config = config();
        config.skip_frames = 2;
        let mut source = SyntheticClipSource::new(&config, Device::Cpu)?;
        // 0.5초 * 20fps = 10 프레임 -> 5 프레임
        assert_eq!(source.next_sample()?.target_clip.len(), 5);
        Ok(())
    }

    #[test]
    fn 반사_좌표_범위() {
        for i in 0..100 {
            let p = MovingSquare::bounce(i as f64 * 3.7 - 50.0, 10.0);
            assert!((0.0..=10.0).contains(&p));
        }
        assert_eq!(MovingSquare::bounce(12.0, 10.0), 8.0);
    }
}
