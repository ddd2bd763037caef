use crate::export::save_test_panel;
use crate::predictor::MaskPredictor;
use crate::{InferenceError, InferenceResult};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use oct_dataset::{SampleSource, UnlabeledDataset};
use std::path::{Path, PathBuf};

/// Result of a pass over unlabeled scans.
#[derive(Debug, Clone, Default)]
pub struct InferenceReport {
    pub samples: usize,
    /// One panel per input scan, in input order.
    pub panels: Vec<PathBuf>,
    /// Fraction of predicted-positive pixels per scan: `(irf, srf)`.
    pub positive_fraction: Vec<(f32, f32)>,
}

/// Read a tensor back to the host as `f32`s.
pub fn tensor_to_vec<B: Backend, const D: usize>(t: Tensor<B, D>) -> InferenceResult<Vec<f32>> {
    t.into_data()
        .to_vec::<f32>()
        .map_err(|e| InferenceError::Tensor(format!("{e:?}")))
}

fn positive_fraction(mask: &[f32]) -> f32 {
    if mask.is_empty() {
        return 0.0;
    }
    mask.iter().filter(|v| **v > 0.5).count() as f32 / mask.len() as f32
}

/// Predict masks for every scan in `dataset`, in order, and write one
/// side-by-side panel per scan into `results_dir`, named after the scan.
pub fn run_test_inference<B: Backend>(
    predictor: &MaskPredictor<B>,
    dataset: &UnlabeledDataset,
    batch_size: usize,
    results_dir: &Path,
    device: &B::Device,
) -> anyhow::Result<InferenceReport> {
    let mut report = InferenceReport::default();
    let mut iter = dataset.batches(batch_size, None);
    while let Some(batch) = iter.next_batch::<B>(device)? {
        let [n, _, h, w] = batch.images.dims();
        let plane = h * w;
        let masks = predictor.predict(batch.images.clone());
        let scans = tensor_to_vec(batch.images)?;
        let irf = tensor_to_vec(masks.irf)?;
        let srf = tensor_to_vec(masks.srf)?;

        for (i, path) in batch.paths.iter().enumerate().take(n) {
            let range = i * plane..(i + 1) * plane;
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("sample_{}", report.samples));
            let out = save_test_panel(
                results_dir,
                &stem,
                h as u32,
                &scans[range.clone()],
                &srf[range.clone()],
                &irf[range.clone()],
            )?;
            tracing::debug!(input = %path.display(), panel = %out.display(), "wrote panel");
            report.positive_fraction.push((
                positive_fraction(&irf[range.clone()]),
                positive_fraction(&srf[range]),
            ));
            report.panels.push(out);
            report.samples += 1;
        }
    }
    tracing::info!(
        samples = report.samples,
        results_dir = %results_dir.display(),
        "test inference complete"
    );
    Ok(report)
}
