//! # 체크포인트
//!
//! 디렉터리 하나에 세 파일을 쓴다.
//! - `model.safetensors`: 모델 파라미터
//! - `optimizer.safetensors`: Adam 1/2차 모멘트 (`<param>.m`, `<param>.v`)
//! - `session.json`: 카운터, 재시작 플래그, 저장 시각, 설정

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use candle_core::Var;
use candle_nn::Optimizer;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use super::session::TrainingSession;
use crate::core::config::TrainingConfig;
use crate::core::error::{VideoError, VideoResult};
use crate::core::optimizers::AdamOptimizer;

pub const MODEL_FILE: &str = "model.safetensors";
pub const OPTIMIZER_FILE: &str = "optimizer.safetensors";
pub const SESSION_FILE: &str = "session.json";

const CHECKPOINT_PREFIX: &str = "epoch_";

/// `session.json` 내용
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub epoch: usize,
    pub iteration: usize,
    pub optimizer_steps: usize,
    pub optimizer_generation: usize,
    pub optimizer_restarted: bool,
    pub saved_at: DateTime<Utc>,
    pub config: TrainingConfig,
}

pub fn checkpoint_name(epoch: usize, iteration: usize) -> String {
    format!("{}{:05}_iter_{:08}", CHECKPOINT_PREFIX, epoch, iteration)
}

/// `root` 아래에서 가장 최근 체크포인트 디렉터리
pub fn latest_checkpoint(root: impl AsRef<Path>) -> VideoResult<Option<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Ok(None);
    }
    let mut candidates = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        let is_checkpoint = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(CHECKPOINT_PREFIX))
            .unwrap_or(false);
        if is_checkpoint && path.join(SESSION_FILE).is_file() {
            candidates.push(path);
        }
    }
    // 이름이 0 채움 숫자이므로 사전순 = 시간순
    candidates.sort();
    Ok(candidates.pop())
}

fn named_vars(session: &TrainingSession) -> VideoResult<HashMap<String, Var>> {
    let data = session
        .var_map()
        .data()
        .lock()
        .map_err(|_| VideoError::checkpoint("parameter map lock poisoned"))?;
    Ok(data.clone())
}

impl TrainingSession {
    /// `root/<epoch_iter>/` 에 저장하고 그 경로를 돌려준다
    pub fn save_checkpoint(&self, root: impl AsRef<Path>) -> VideoResult<PathBuf> {
        let dir = root
            .as_ref()
            .join(checkpoint_name(self.epoch(), self.iteration()));
        fs::create_dir_all(&dir)?;

        self.var_map().save(dir.join(MODEL_FILE))?;

        let moments = self.optimizer().export_moments(&named_vars(self)?);
        candle_core::safetensors::save(&moments, dir.join(OPTIMIZER_FILE))?;

        let meta = SessionMeta {
            epoch: self.epoch(),
            iteration: self.iteration(),
            optimizer_steps: self.optimizer().step_count(),
            optimizer_generation: self.optimizer_generation(),
            optimizer_restarted: self.optimizer_restarted(),
            saved_at: Utc::now(),
            config: self.config().clone(),
        };
        fs::write(dir.join(SESSION_FILE), serde_json::to_string_pretty(&meta)?)?;

        info!("체크포인트 저장: {}", dir.display());
        Ok(dir)
    }

    /// 체크포인트 디렉터리에서 파라미터, 모멘트, 카운터를 복원
    ///
    /// 모델 구성이 다르면 거부한다.
    pub fn load_checkpoint(&mut self, dir: impl AsRef<Path>) -> VideoResult<SessionMeta> {
        let dir = dir.as_ref();
        let session_path = dir.join(SESSION_FILE);
        if !session_path.is_file() {
            return Err(VideoError::checkpoint(format!(
                "{} not found",
                session_path.display()
            )));
        }
        let meta: SessionMeta = serde_json::from_str(&fs::read_to_string(&session_path)?)?;
        if meta.config.model != self.config().model {
            return Err(VideoError::checkpoint(
                "model configuration differs from checkpoint",
            ));
        }

        self.var_map_mut().load(dir.join(MODEL_FILE))?;

        let moments = candle_core::safetensors::load(dir.join(OPTIMIZER_FILE), self.device())?;
        let mut optimizer =
            AdamOptimizer::new(self.var_map().all_vars(), self.config().optimizer.clone())?;
        optimizer.import_moments(&named_vars(self)?, &moments, meta.optimizer_steps)?;
        self.replace_optimizer(optimizer);

        self.restore_counters(
            meta.epoch,
            meta.iteration,
            meta.optimizer_generation,
            meta.optimizer_restarted,
        );
        info!(
            "체크포인트 복원: {} (epoch {}, iter {}, 저장 {})",
            dir.display(),
            meta.epoch,
            meta.iteration,
            meta.saved_at
        );
        Ok(meta)
    }
}
