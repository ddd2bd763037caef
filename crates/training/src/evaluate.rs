use crate::metrics::{jaccard, ConfusionCounts};
use burn::tensor::backend::Backend;
use inference::{save_validation_panel, tensor_to_vec, MaskPredictor};
use oct_dataset::{LabeledDataset, SampleSource};
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Scores of one pass over a labeled split.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvalReport {
    pub samples: usize,
    /// SRF Jaccard of each batch, computed over the flattened batch.
    pub batch_srf_jaccard: Vec<f64>,
    /// Pixel counts accumulated over every batch.
    pub irf: ConfusionCounts,
    pub srf: ConfusionCounts,
    #[serde(skip)]
    pub panels: Vec<PathBuf>,
}

impl EvalReport {
    pub fn mean_batch_srf_jaccard(&self) -> f64 {
        if self.batch_srf_jaccard.is_empty() {
            return 0.0;
        }
        self.batch_srf_jaccard.iter().sum::<f64>() / self.batch_srf_jaccard.len() as f64
    }
}

/// Threshold both heads on every batch of `dataset` and score them against
/// the ground truth. With `panels_dir`, also writes a 2x2 panel per sample
/// (SRF truth, SRF prediction / IRF truth, IRF prediction).
pub fn evaluate<B: Backend>(
    predictor: &MaskPredictor<B>,
    dataset: &LabeledDataset,
    batch_size: usize,
    rng: Option<&mut StdRng>,
    panels_dir: Option<&Path>,
    device: &B::Device,
) -> anyhow::Result<EvalReport> {
    let mut report = EvalReport::default();
    let mut iter = dataset.batches(batch_size, rng);
    while let Some(batch) = iter.next_batch::<B>(device)? {
        let [_, _, h, w] = batch.images.dims();
        let masks = predictor.predict(batch.images);
        let irf_gt = tensor_to_vec(batch.irf)?;
        let srf_gt = tensor_to_vec(batch.srf)?;
        let irf_pred = tensor_to_vec(masks.irf)?;
        let srf_pred = tensor_to_vec(masks.srf)?;

        let score = jaccard(&srf_gt, &srf_pred);
        tracing::info!(
            batch = report.batch_srf_jaccard.len(),
            samples = batch.names.len(),
            srf_jaccard = score,
            "validation batch"
        );
        report.batch_srf_jaccard.push(score);
        report.irf.merge(&ConfusionCounts::from_masks(&irf_gt, &irf_pred));
        report.srf.merge(&ConfusionCounts::from_masks(&srf_gt, &srf_pred));

        if let Some(dir) = panels_dir {
            let plane = h * w;
            for (i, name) in batch.names.iter().enumerate() {
                let range = i * plane..(i + 1) * plane;
                let stem = Path::new(name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(name.as_str());
                let panel = save_validation_panel(
                    dir,
                    stem,
                    h as u32,
                    (&srf_gt[range.clone()], &srf_pred[range.clone()]),
                    (&irf_gt[range.clone()], &irf_pred[range]),
                )?;
                report.panels.push(panel);
            }
        }
        report.samples += batch.names.len();
    }

    tracing::info!(
        samples = report.samples,
        mean_batch_srf_jaccard = report.mean_batch_srf_jaccard(),
        irf_jaccard = report.irf.jaccard(),
        srf_jaccard = report.srf.jaccard(),
        srf_precision = report.srf.precision(),
        srf_recall = report.srf.recall(),
        irf_precision = report.irf.precision(),
        irf_recall = report.irf.recall(),
        "evaluation complete"
    );
    Ok(report)
}
