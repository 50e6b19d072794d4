use candle_core::{Device, Tensor};
use simple_video::core::training::clip_l1_loss;
use simple_video::{
    Clip, ClipSample, ModelConfig, TrainingConfig, TrainingSession, VideoResult,
};

fn config() -> TrainingConfig {
    let mut config = TrainingConfig::new()
        .with_model(ModelConfig::new().with_hidden_dim(4).with_resolution(16))
        .with_clip_length(0.5, 20)
        .with_restart_iteration(Some(20));
    config.iterations_per_epoch = 50;
    config
}

fn sample(len: usize) -> VideoResult<ClipSample> {
    let frames = (0..len)
        .map(|_| Tensor::rand(0f32, 1f32, (1, 3, 16, 16), &Device::Cpu))
        .collect::<candle_core::Result<Vec<_>>>()?;
    ClipSample::from_target(Clip::new(frames)?)
}

#[test]
fn 재시작은_반복_20에서_한번만_테스트() -> VideoResult<()> {
    let mut session = TrainingSession::with_device(config(), Device::Cpu)?;
    let sample = sample(10)?;

    let mut reports = Vec::new();
    for _ in 0..50 {
        reports.push(session.train_step(0, &sample)?);
    }

    let restarted: Vec<usize> = reports
        .iter()
        .filter(|r| r.restarted)
        .map(|r| r.iteration)
        .collect();
    assert_eq!(restarted, vec![20]);
    assert!(reports[..20].iter().all(|r| r.optimizer_generation == 0));
    assert!(reports[20..].iter().all(|r| r.optimizer_generation == 1));
    assert_eq!(session.optimizer().step_count(), 30);
    Ok(())
}

#[test]
fn 타깃_5프레임_손실_범위_테스트() -> VideoResult<()> {
    let mut session = TrainingSession::with_device(config(), Device::Cpu)?;
    let sample = sample(5)?;

    let report = session.train_step(0, &sample)?;
    assert_eq!(report.horizon, 8);
    assert_eq!(report.supervised_len, 5);
    assert_eq!(session.loss_trace().x(), vec![1, 2, 3, 4]);

    // 같은 예측/타깃이면 손실은 항상 같다
    let predicted = session.predicted_clip().expect("predicted clip").clone();
    let a = clip_l1_loss(&predicted, &sample.target_clip, 8)?.value()?;
    let b = clip_l1_loss(&predicted, &sample.target_clip, 8)?.value()?;
    assert_eq!(a, b);
    Ok(())
}
