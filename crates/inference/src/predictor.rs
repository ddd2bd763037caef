use crate::{InferenceError, InferenceResult};
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use models::{DualUnet, DualUnetConfig};
use std::path::Path;

/// Probability cut-off applied after the sigmoid.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Binary masks (0.0 / 1.0) for both heads, `[N, 1, H, W]` each.
#[derive(Debug, Clone)]
pub struct PredictedMasks<B: Backend> {
    pub irf: Tensor<B, 4>,
    pub srf: Tensor<B, 4>,
}

/// `sigmoid(logits) > threshold` as floats.
pub fn threshold_logits<B: Backend>(logits: Tensor<B, 4>, threshold: f32) -> Tensor<B, 4> {
    sigmoid(logits).greater_elem(threshold).float()
}

/// A frozen network plus the threshold that turns its logits into masks.
///
/// Instantiate on a non-autodiff backend: batch normalization then uses its
/// running statistics, which is what evaluation needs.
#[derive(Debug)]
pub struct MaskPredictor<B: Backend> {
    model: DualUnet<B>,
    threshold: f32,
}

impl<B: Backend> MaskPredictor<B> {
    pub fn from_model(model: DualUnet<B>, threshold: f32) -> Self {
        Self { model, threshold }
    }

    /// Load weights written by the training loop. The model config must match
    /// the one used for training.
    pub fn load(
        path: &Path,
        cfg: DualUnetConfig,
        threshold: f32,
        device: &B::Device,
    ) -> InferenceResult<Self> {
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        let model = DualUnet::<B>::new(cfg, device)
            .load_file(path, &recorder, device)
            .map_err(|e| InferenceError::Checkpoint {
                path: path.to_path_buf(),
                msg: e.to_string(),
            })?;
        tracing::info!(checkpoint = %path.display(), "loaded checkpoint");
        Ok(Self::from_model(model, threshold))
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn model(&self) -> &DualUnet<B> {
        &self.model
    }

    pub fn predict(&self, images: Tensor<B, 4>) -> PredictedMasks<B> {
        let logits = self.model.forward(images);
        PredictedMasks {
            irf: threshold_logits(logits.irf, self.threshold),
            srf: threshold_logits(logits.srf, self.threshold),
        }
    }
}
