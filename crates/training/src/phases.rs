//! Entry points for the train, eval and infer binaries.
//!
//! Each phase takes the resolved [`RunConfig`] and returns its own result
//! struct; the checkpoint file and its JSON sidecars are the only state
//! shared between phases.

use crate::checkpoint::{read_json, write_json, SplitManifest};
use crate::config::RunConfig;
use crate::evaluate::{evaluate, EvalReport};
use crate::train::{train, TrainOutcome};
use crate::TrainBackend;
use burn::backend::Autodiff;
use burn::tensor::backend::Backend;
use inference::{run_test_inference, InferenceBackend, InferenceReport, MaskPredictor};
use oct_dataset::{list_image_names, list_image_paths, make_rng, split_names};
use oct_dataset::{LabeledDataset, UnlabeledDataset};
use std::fs;

type ADBackend = Autodiff<TrainBackend>;

/// Split the labeled scans, record the split, train, and write the loss history.
pub fn run_train(cfg: &RunConfig) -> anyhow::Result<TrainOutcome<ADBackend>> {
    let roots = cfg.labeled_roots();
    let names = list_image_names(&roots.oct)?;
    let mut rng = make_rng(cfg.seed);
    let (train_names, val_names) = split_names(names, cfg.val_ratio, &mut rng);
    tracing::info!(
        train = train_names.len(),
        val = val_names.len(),
        data_root = %cfg.data_root.display(),
        "split labeled scans"
    );

    if let Some(parent) = cfg.checkpoint.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", parent.display()))?;
    }
    let manifest = SplitManifest {
        seed: cfg.seed,
        train: train_names.clone(),
        val: val_names,
    };
    write_json(&manifest, &cfg.split_path())?;

    let dataset = LabeledDataset::with_image_size(train_names, roots, cfg.image_size);
    let device = <ADBackend as Backend>::Device::default();
    let outcome = train::<ADBackend>(cfg, &dataset, &mut rng, &device)?;

    let history_path = cfg.loss_history_path();
    write_json(&outcome.history, &history_path)?;
    tracing::info!(path = %history_path.display(), "wrote loss history");
    Ok(outcome)
}

/// Score the best checkpoint on the validation names recorded by training.
/// Without a split file every labeled scan is used.
pub fn run_eval(
    cfg: &RunConfig,
    panels_dir: Option<&std::path::Path>,
) -> anyhow::Result<EvalReport> {
    let roots = cfg.labeled_roots();
    let split_path = cfg.split_path();
    let names = if split_path.is_file() {
        read_json::<SplitManifest>(&split_path)?.val
    } else {
        tracing::warn!(
            split = %split_path.display(),
            "no split file; evaluating on every labeled scan"
        );
        list_image_names(&roots.oct)?
    };
    if names.is_empty() {
        anyhow::bail!("no validation scans listed in {}", split_path.display());
    }

    let device = <TrainBackend as Backend>::Device::default();
    let predictor = MaskPredictor::<TrainBackend>::load(
        &cfg.checkpoint_path(),
        cfg.model_config(),
        cfg.threshold,
        &device,
    )?;
    let dataset = LabeledDataset::with_image_size(names, roots, cfg.image_size);
    let mut rng = make_rng(cfg.seed);
    evaluate(
        &predictor,
        &dataset,
        cfg.batch_size,
        Some(&mut rng),
        panels_dir,
        &device,
    )
}

/// Predict masks for the unlabeled test scans and export one panel each.
pub fn run_infer(cfg: &RunConfig) -> anyhow::Result<InferenceReport> {
    let paths = list_image_paths(&cfg.test_dir)?;
    let device = <InferenceBackend as Backend>::Device::default();
    let predictor = MaskPredictor::<InferenceBackend>::load(
        &cfg.checkpoint_path(),
        cfg.model_config(),
        cfg.threshold,
        &device,
    )?;
    let dataset = UnlabeledDataset::with_image_size(paths, cfg.image_size);
    run_test_inference(
        &predictor,
        &dataset,
        cfg.batch_size,
        &cfg.results_dir,
        &device,
    )
}
