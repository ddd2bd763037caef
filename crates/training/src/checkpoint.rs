use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use models::DualUnet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type TrainResult<T> = Result<T, TrainError>;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("epoch {epoch} produced a non-finite loss ({loss})")]
    NonFiniteLoss { epoch: usize, loss: f64 },
    #[error("failed to save checkpoint {path}: {msg}")]
    Checkpoint { path: PathBuf, msg: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Keeps the lowest epoch loss seen so far; the sentinel starts at +inf.
#[derive(Debug, Clone)]
pub struct BestLossTracker {
    best: f64,
    best_epoch: Option<usize>,
}

impl Default for BestLossTracker {
    fn default() -> Self {
        Self {
            best: f64::INFINITY,
            best_epoch: None,
        }
    }
}

impl BestLossTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok(true)` when `loss` is strictly below every earlier epoch, i.e. the
    /// caller should overwrite the checkpoint. NaN or infinite losses are errors.
    pub fn observe(&mut self, epoch: usize, loss: f64) -> TrainResult<bool> {
        if !loss.is_finite() {
            return Err(TrainError::NonFiniteLoss { epoch, loss });
        }
        if loss < self.best {
            self.best = loss;
            self.best_epoch = Some(epoch);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn best(&self) -> Option<(usize, f64)> {
        self.best_epoch.map(|epoch| (epoch, self.best))
    }
}

/// Overwrite `path` with the network's full-precision record.
pub fn save_checkpoint<B: Backend>(model: &DualUnet<B>, path: &Path) -> TrainResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| TrainError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(path, &recorder)
        .map_err(|e| TrainError::Checkpoint {
            path: path.to_path_buf(),
            msg: e.to_string(),
        })
}

/// Per-epoch training losses plus the epoch whose weights were kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    pub epochs: Vec<f64>,
    pub best_epoch: Option<usize>,
    pub best_loss: Option<f64>,
}

/// File names used for training and validation in one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitManifest {
    pub seed: Option<u64>,
    pub train: Vec<String>,
    pub val: Vec<String>,
}

pub fn write_json<T: Serialize>(value: &T, path: &Path) -> TrainResult<()> {
    let raw = serde_json::to_vec_pretty(value).map_err(|source| TrainError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, raw).map_err(|source| TrainError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> TrainResult<T> {
    let raw = fs::read(path).map_err(|source| TrainError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| TrainError::Json {
        path: path.to_path_buf(),
        source,
    })
}
