#![recursion_limit = "256"]

pub mod checkpoint;
pub mod config;
pub mod evaluate;
pub mod loss;
pub mod metrics;
pub mod phases;
pub mod train;

pub use checkpoint::{
    save_checkpoint, BestLossTracker, LossHistory, SplitManifest, TrainError, TrainResult,
};
pub use config::{RunConfig, RunOverrides, UpsamplingArg};
pub use evaluate::{evaluate, EvalReport};
pub use loss::dice_loss;
pub use metrics::{jaccard, ConfusionCounts};
pub use phases::{run_eval, run_infer, run_train};
pub use train::{train, TrainOutcome};

/// Backend alias for training/eval (NdArray by default; WGPU if enabled).
#[cfg(feature = "backend-wgpu")]
pub type TrainBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type TrainBackend = burn_ndarray::NdArray<f32>;
