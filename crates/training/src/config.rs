//! Run configuration shared by the train, eval and infer phases.
//!
//! Values come from [`RunConfig::default`], optionally overlaid by a TOML
//! file, then by command-line flags ([`RunOverrides`]).

use clap::{Args, ValueEnum};
use models::{DualUnetConfig, UpsamplingKind};
use oct_dataset::LabeledRoots;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const BATCH_SIZE: usize = 16;
pub const N_EPOCHS: usize = 150;
pub const LEARNING_RATE: f64 = 5e-4;
pub const VAL_RATIO: f32 = 0.1;
pub const CHECKPOINT_EXTENSION: &str = "bin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Directory holding `oct/`, `irf/` and `srf/`.
    pub data_root: PathBuf,
    /// Unlabeled scans for test inference.
    pub test_dir: PathBuf,
    /// Where test panels are written.
    pub results_dir: PathBuf,
    /// Best-so-far weights; overwritten whenever the epoch loss improves.
    pub checkpoint: PathBuf,
    pub batch_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub image_size: u32,
    /// Probability cut-off for predicted masks.
    pub threshold: f32,
    pub val_ratio: f32,
    /// Seed for the split and per-epoch shuffling; random when unset.
    pub seed: Option<u64>,
    pub upsampling: UpsamplingKind,
    pub base_channels: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        let model = DualUnetConfig::default();
        Self {
            data_root: PathBuf::from("data/eye"),
            test_dir: PathBuf::from("data/test_oct"),
            results_dir: PathBuf::from("artifacts/test_results"),
            checkpoint: PathBuf::from("artifacts/dual_unet.bin"),
            batch_size: BATCH_SIZE,
            epochs: N_EPOCHS,
            learning_rate: LEARNING_RATE,
            image_size: oct_dataset::IMAGE_SIZE,
            threshold: inference::DEFAULT_THRESHOLD,
            val_ratio: VAL_RATIO,
            seed: None,
            upsampling: model.upsampling,
            base_channels: model.base_channels,
        }
    }
}

impl RunConfig {
    pub fn from_toml_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
        toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse config {}: {e}", path.display()))
    }

    /// Defaults, overlaid by `path` when given, overlaid by `overrides`.
    pub fn resolve(path: Option<&Path>, overrides: &RunOverrides) -> anyhow::Result<Self> {
        let base = match path {
            Some(path) => Self::from_toml_path(path)?,
            None => Self::default(),
        };
        let mut cfg = overrides.apply(base);
        cfg.validate()?;
        let normalized = cfg.checkpoint_path();
        if normalized != cfg.checkpoint {
            tracing::warn!(
                requested = %cfg.checkpoint.display(),
                path = %normalized.display(),
                "checkpoints are always written with a .bin extension"
            );
            cfg.checkpoint = normalized;
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be positive");
        }
        // Four 2x pooling stages need at least one pixel left at the bottleneck.
        if self.image_size < 16 {
            anyhow::bail!("image_size must be at least 16, got {}", self.image_size);
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            anyhow::bail!("learning_rate must be positive, got {}", self.learning_rate);
        }
        if !(0.0..1.0).contains(&self.threshold) {
            anyhow::bail!("threshold must be in [0, 1), got {}", self.threshold);
        }
        if !(0.0..1.0).contains(&self.val_ratio) {
            anyhow::bail!("val_ratio must be in [0, 1), got {}", self.val_ratio);
        }
        if self.base_channels == 0 {
            anyhow::bail!("base_channels must be positive");
        }
        Ok(())
    }

    pub fn labeled_roots(&self) -> LabeledRoots {
        LabeledRoots::from_data_root(&self.data_root)
    }

    pub fn model_config(&self) -> DualUnetConfig {
        DualUnetConfig {
            base_channels: self.base_channels,
            upsampling: self.upsampling,
            ..Default::default()
        }
    }

    /// The file the binary recorder actually reads and writes: `checkpoint`
    /// with its extension forced to `.bin`.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint.with_extension(CHECKPOINT_EXTENSION)
    }

    /// Per-epoch losses, next to the checkpoint.
    pub fn loss_history_path(&self) -> PathBuf {
        self.checkpoint.with_extension("losses.json")
    }

    /// Train/validation file names used by the last training run.
    pub fn split_path(&self) -> PathBuf {
        self.checkpoint.with_extension("split.json")
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum UpsamplingArg {
    Learned,
    Bilinear,
}

impl From<UpsamplingArg> for UpsamplingKind {
    fn from(arg: UpsamplingArg) -> Self {
        match arg {
            UpsamplingArg::Learned => UpsamplingKind::Learned,
            UpsamplingArg::Bilinear => UpsamplingKind::Bilinear,
        }
    }
}

/// Command-line overrides; anything left unset keeps the file/default value.
#[derive(Args, Debug, Clone, Default)]
pub struct RunOverrides {
    /// Directory holding oct/, irf/ and srf/ subdirectories.
    #[arg(long)]
    pub data_root: Option<PathBuf>,
    /// Directory of unlabeled test scans.
    #[arg(long)]
    pub test_dir: Option<PathBuf>,
    /// Output directory for test panels.
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
    /// Checkpoint path.
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,
    /// Batch size (default 16).
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Number of epochs (default 150).
    #[arg(long)]
    pub epochs: Option<usize>,
    /// Adam learning rate (default 0.0005).
    #[arg(long)]
    pub lr: Option<f64>,
    /// Square input resolution (default 224).
    #[arg(long)]
    pub image_size: Option<u32>,
    /// Mask probability threshold (default 0.5).
    #[arg(long)]
    pub threshold: Option<f32>,
    /// Fraction of labeled scans held out for validation (default 0.1).
    #[arg(long)]
    pub val_ratio: Option<f32>,
    /// Seed for splitting and shuffling.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Decoder upsampling variant.
    #[arg(long, value_enum)]
    pub upsampling: Option<UpsamplingArg>,
    /// Stem width; encoder stages double it (default 64).
    #[arg(long)]
    pub base_channels: Option<usize>,
}

impl RunOverrides {
    pub fn apply(&self, mut cfg: RunConfig) -> RunConfig {
        if let Some(v) = &self.data_root {
            cfg.data_root = v.clone();
        }
        if let Some(v) = &self.test_dir {
            cfg.test_dir = v.clone();
        }
        if let Some(v) = &self.results_dir {
            cfg.results_dir = v.clone();
        }
        if let Some(v) = &self.checkpoint {
            cfg.checkpoint = v.clone();
        }
        if let Some(v) = self.batch_size {
            cfg.batch_size = v;
        }
        if let Some(v) = self.epochs {
            cfg.epochs = v;
        }
        if let Some(v) = self.lr {
            cfg.learning_rate = v;
        }
        if let Some(v) = self.image_size {
            cfg.image_size = v;
        }
        if let Some(v) = self.threshold {
            cfg.threshold = v;
        }
        if let Some(v) = self.val_ratio {
            cfg.val_ratio = v;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if let Some(v) = self.upsampling {
            cfg.upsampling = v.into();
        }
        if let Some(v) = self.base_channels {
            cfg.base_channels = v;
        }
        cfg
    }
}
