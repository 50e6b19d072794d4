use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use simple_video::core::training::latest_checkpoint;
use simple_video::{ModelConfig, SyntheticClipSource, TrainingConfig, TrainingSession};

fn cli() -> Command {
    Command::new("video-train")
        .version("0.1.0")
        .about("단일 프레임 조건 비디오 합성 모델 학습")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("JSON")
                .value_parser(value_parser!(PathBuf))
                .help("학습 설정 JSON 파일"),
        )
        .arg(
            Arg::new("epochs")
                .long("epochs")
                .value_parser(value_parser!(usize))
                .help("학습할 에포크 수"),
        )
        .arg(
            Arg::new("iterations")
                .long("iterations")
                .value_parser(value_parser!(usize))
                .help("에포크당 반복 수"),
        )
        .arg(
            Arg::new("resolution")
                .long("resolution")
                .value_parser(value_parser!(usize))
                .help("프레임 해상도 (stride 의 배수)"),
        )
        .arg(
            Arg::new("hidden-dim")
                .long("hidden-dim")
                .value_parser(value_parser!(usize))
                .help("잠재 공간 채널 수"),
        )
        .arg(
            Arg::new("batch-size")
                .long("batch-size")
                .value_parser(value_parser!(usize))
                .help("배치 크기"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("난수 시드"),
        )
        .arg(
            Arg::new("checkpoint-dir")
                .long("checkpoint-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("체크포인트 저장 디렉터리"),
        )
        .arg(
            Arg::new("resume")
                .long("resume")
                .help("체크포인트 디렉터리의 마지막 체크포인트에서 이어서 학습")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("cuda")
                .long("cuda")
                .help("CUDA 장치 사용 (불가능하면 CPU)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-config")
                .long("dump-config")
                .value_name("JSON")
                .value_parser(value_parser!(PathBuf))
                .help("최종 설정을 JSON 으로 저장하고 종료"),
        )
}

fn build_config(matches: &clap::ArgMatches) -> Result<TrainingConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => TrainingConfig::from_json_file(path)
            .with_context(|| format!("설정 파일 읽기 실패: {}", path.display()))?,
        None => TrainingConfig::default(),
    };

    let mut model: ModelConfig = config.model.clone();
    if let Some(&resolution) = matches.get_one::<usize>("resolution") {
        model = model.with_resolution(resolution);
    }
    if let Some(&hidden_dim) = matches.get_one::<usize>("hidden-dim") {
        model = model.with_hidden_dim(hidden_dim);
    }
    config = config.with_model(model);

    if let Some(&epochs) = matches.get_one::<usize>("epochs") {
        config.epochs = epochs;
    }
    if let Some(&iterations) = matches.get_one::<usize>("iterations") {
        config.iterations_per_epoch = iterations;
    }
    if let Some(&batch_size) = matches.get_one::<usize>("batch-size") {
        config = config.with_batch_size(batch_size);
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config = config.with_seed(seed);
    }
    if let Some(dir) = matches.get_one::<PathBuf>("checkpoint-dir") {
        config.checkpoint_dir = Some(dir.clone());
    }
    if matches.get_flag("cuda") {
        config.use_cuda = true;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let matches = cli().get_matches();
    let config = build_config(&matches)?;

    if let Some(path) = matches.get_one::<PathBuf>("dump-config") {
        config.save_json(path)?;
        println!("설정 저장: {}", path.display());
        return Ok(());
    }

    let mut session = TrainingSession::new(config.clone())?;
    if matches.get_flag("resume") {
        let root = config
            .checkpoint_dir
            .as_ref()
            .context("--resume 에는 --checkpoint-dir 가 필요합니다")?;
        match latest_checkpoint(root)? {
            Some(dir) => {
                session.load_checkpoint(&dir)?;
            }
            None => info!("{} 에 체크포인트가 없어 처음부터 학습", root.display()),
        }
    }

    let mut source = SyntheticClipSource::new(&config, session.device().clone())?;
    let start_epoch = session.resume_epoch();
    let started = Instant::now();

    println!(
        "학습 시작: epoch {}..{}, 해상도 {}, 전체 호라이즌 {}",
        start_epoch,
        config.epochs,
        config.model.resolution,
        config.total_horizon()
    );

    for epoch in start_epoch..config.epochs {
        let pb = ProgressBar::new(config.iterations_per_epoch as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("epoch {prefix} [{bar:40}] {pos}/{len} {msg}")?,
        );
        pb.set_prefix(epoch.to_string());

        let summary = session.train_epoch(epoch, &mut source, |report| {
            pb.set_message(format!("horizon {} loss {:.5}", report.horizon, report.loss));
            pb.inc(1);
        })?;
        pb.finish_with_message(format!(
            "horizon {} 평균 손실 {:.5}",
            summary.horizon, summary.mean_loss
        ));

        if let Some(root) = &config.checkpoint_dir {
            let due = config.checkpoint_every > 0 && (epoch + 1) % config.checkpoint_every == 0;
            if due || epoch + 1 == config.epochs {
                session.save_checkpoint(root)?;
            }
        }
    }

    let trace = session.loss_trace();
    println!(
        "학습 완료: {:.1}s, 반복 {}, 마지막 프레임별 손실 {:?}",
        started.elapsed().as_secs_f64(),
        session.iteration(),
        trace.tail(4).iter().map(|p| p.loss).collect::<Vec<_>>()
    );
    Ok(())
}
