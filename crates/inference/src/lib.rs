#![recursion_limit = "256"]

pub mod export;
pub mod predictor;
pub mod runner;

use std::path::PathBuf;
use thiserror::Error;

#[cfg(feature = "backend-wgpu")]
pub type InferenceBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type InferenceBackend = burn_ndarray::NdArray<f32>;

pub type InferenceResult<T> = Result<T, InferenceError>;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("failed to load checkpoint {path}: {msg}")]
    Checkpoint { path: PathBuf, msg: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("tensor readback failed: {0}")]
    Tensor(String),
}

pub use export::{plane_to_gray, save_test_panel, save_validation_panel, tile_grid};
pub use predictor::{threshold_logits, MaskPredictor, PredictedMasks, DEFAULT_THRESHOLD};
pub use runner::{run_test_inference, tensor_to_vec, InferenceReport};

pub mod prelude {
    pub use crate::predictor::{MaskPredictor, PredictedMasks};
    pub use crate::runner::{run_test_inference, InferenceReport};
    pub use crate::InferenceBackend;
}
