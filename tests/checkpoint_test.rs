use candle_core::Device;
use simple_video::core::training::latest_checkpoint;
use simple_video::{
    ClipSource, ModelConfig, SyntheticClipSource, TrainingConfig, TrainingSession, VideoError,
    VideoResult,
};
use tempfile::TempDir;

fn config() -> TrainingConfig {
    let mut config = TrainingConfig::new()
        .with_model(ModelConfig::new().with_hidden_dim(4).with_resolution(16))
        .with_clip_length(0.5, 20)
        .with_restart_iteration(Some(1));
    config.iterations_per_epoch = 3;
    config
}

fn parameters(session: &TrainingSession) -> VideoResult<Vec<(String, Vec<f32>)>> {
    let data = session.var_map().data().lock().expect("var map lock");
    let mut named = Vec::new();
    for (name, var) in data.iter() {
        named.push((name.clone(), var.as_tensor().flatten_all()?.to_vec1::<f32>()?));
    }
    named.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(named)
}

#[test]
fn 체크포인트_왕복_테스트() -> VideoResult<()> {
    let dir = TempDir::new()?;
    let config = config();

    let mut trained = TrainingSession::with_device(config.clone(), Device::Cpu)?;
    let mut source = SyntheticClipSource::new(&config, Device::Cpu)?;
    trained.train_epoch(0, &mut source, |_| {})?;
    let saved = trained.save_checkpoint(dir.path())?;

    assert_eq!(latest_checkpoint(dir.path())?, Some(saved.clone()));

    let mut restored = TrainingSession::with_device(config, Device::Cpu)?;
    let meta = restored.load_checkpoint(&saved)?;

    assert_eq!(meta.iteration, 3);
    assert_eq!(restored.iteration(), 3);
    assert_eq!(restored.resume_epoch(), 1);
    assert_eq!(restored.optimizer_generation(), 1);
    assert!(restored.optimizer_restarted());
    assert_eq!(
        restored.optimizer().step_count(),
        trained.optimizer().step_count()
    );
    assert_eq!(parameters(&restored)?, parameters(&trained)?);

    // 재시작은 이미 일어났으므로 이어서 학습해도 다시 일어나지 않는다
    let report = restored.train_step(1, &source.next_sample()?)?;
    assert!(!report.restarted);
    assert_eq!(report.optimizer_generation, 1);
    Ok(())
}

#[test]
fn 가장_최근_체크포인트_선택_테스트() -> VideoResult<()> {
    let dir = TempDir::new()?;
    let config = config();
    let mut session = TrainingSession::with_device(config.clone(), Device::Cpu)?;
    let mut source = SyntheticClipSource::new(&config, Device::Cpu)?;

    assert_eq!(latest_checkpoint(dir.path())?, None);

    session.train_epoch(0, &mut source, |_| {})?;
    let first = session.save_checkpoint(dir.path())?;
    session.train_epoch(1, &mut source, |_| {})?;
    let second = session.save_checkpoint(dir.path())?;

    assert_ne!(first, second);
    assert_eq!(latest_checkpoint(dir.path())?, Some(second));
    Ok(())
}

#[test]
fn 모델_구성_불일치_거부_테스트() -> VideoResult<()> {
    let dir = TempDir::new()?;
    let session = TrainingSession::with_device(config(), Device::Cpu)?;
    let saved = session.save_checkpoint(dir.path())?;

    let other = config().with_model(ModelConfig::new().with_hidden_dim(8).with_resolution(16));
    let mut mismatched = TrainingSession::with_device(other, Device::Cpu)?;
    assert!(matches!(
        mismatched.load_checkpoint(&saved),
        Err(VideoError::Checkpoint(_))
    ));
    Ok(())
}
