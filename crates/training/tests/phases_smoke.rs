use image::{GrayImage, Luma};
use std::path::Path;
use training::{run_eval, run_infer, run_train, LossHistory, RunConfig, SplitManifest};

fn write_scan(dir: &Path, name: &str, seed: u8) -> anyhow::Result<()> {
    GrayImage::from_fn(20, 20, |x, y| Luma([(x * 7 + y * 3) as u8 ^ seed]))
        .save(dir.join(name))?;
    Ok(())
}

fn write_mask(dir: &Path, name: &str, offset: u32) -> anyhow::Result<()> {
    GrayImage::from_fn(20, 20, |x, y| {
        let inside = (offset..offset + 8).contains(&x) && (4..12).contains(&y);
        Luma([if inside { 255 } else { 0 }])
    })
    .save(dir.join(name))?;
    Ok(())
}

fn synthetic_run(root: &Path, scans: usize) -> anyhow::Result<RunConfig> {
    let data = root.join("eye");
    for sub in ["oct", "irf", "srf"] {
        std::fs::create_dir_all(data.join(sub))?;
    }
    for i in 0..scans {
        let name = format!("scan_{i}.png");
        write_scan(&data.join("oct"), &name, i as u8 * 17)?;
        write_mask(&data.join("irf"), &name, 2 + i as u32)?;
        write_mask(&data.join("srf"), &name, 10 - i as u32)?;
    }
    let test_dir = root.join("test_oct");
    std::fs::create_dir_all(&test_dir)?;
    for i in 0..2 {
        write_scan(&test_dir, &format!("test_{i}.png"), 99 + i as u8)?;
    }

    Ok(RunConfig {
        data_root: data,
        test_dir,
        results_dir: root.join("results"),
        checkpoint: root.join("ckpt").join("dual_unet.bin"),
        batch_size: 2,
        epochs: 2,
        image_size: 16,
        val_ratio: 0.2,
        seed: Some(7),
        base_channels: 2,
        ..Default::default()
    })
}

#[test]
fn train_eval_infer_round_trip() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = synthetic_run(tmp.path(), 5)?;
    cfg.validate()?;

    let outcome = run_train(&cfg)?;
    assert_eq!(outcome.history.epochs.len(), 2);
    assert!(outcome.history.epochs.iter().all(|l| l.is_finite() && *l >= 0.0));
    assert!(cfg.checkpoint.is_file());

    let best_epoch = outcome.history.best_epoch.expect("a finite epoch was observed");
    let best_loss = outcome.history.best_loss.expect("best loss recorded");
    assert_eq!(outcome.history.epochs[best_epoch], best_loss);
    assert!(outcome.history.epochs.iter().all(|l| *l >= best_loss));

    let history: LossHistory =
        serde_json::from_slice(&std::fs::read(cfg.loss_history_path())?)?;
    assert_eq!(history, outcome.history);

    let split: SplitManifest = serde_json::from_slice(&std::fs::read(cfg.split_path())?)?;
    assert_eq!(split.val.len(), 1);
    assert_eq!(split.train.len(), 4);
    assert_eq!(split.seed, Some(7));

    let panels = tmp.path().join("val_panels");
    let report = run_eval(&cfg, Some(&panels))?;
    assert_eq!(report.samples, 1);
    assert_eq!(report.batch_srf_jaccard.len(), 1);
    assert!((0.0..=1.0).contains(&report.batch_srf_jaccard[0]));
    assert_eq!(report.panels.len(), 1);
    assert!(report.panels[0].is_file());
    let pixels = (16 * 16) as u64;
    let srf = report.srf;
    assert_eq!(
        srf.true_pos + srf.false_pos + srf.false_neg + srf.true_neg,
        pixels
    );

    let inferred = run_infer(&cfg)?;
    assert_eq!(inferred.samples, 2);
    for panel in &inferred.panels {
        assert!(panel.starts_with(&cfg.results_dir));
        assert!(panel.is_file());
    }
    Ok(())
}

#[test]
fn same_seed_gives_same_split() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut cfg = synthetic_run(tmp.path(), 6)?;
    cfg.epochs = 0;

    run_train(&cfg)?;
    let first: SplitManifest = serde_json::from_slice(&std::fs::read(cfg.split_path())?)?;
    run_train(&cfg)?;
    let second: SplitManifest = serde_json::from_slice(&std::fs::read(cfg.split_path())?)?;
    assert_eq!(first, second);
    assert_eq!(first.val.len(), 2);
    Ok(())
}

#[test]
fn zero_epochs_never_write_a_checkpoint() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut cfg = synthetic_run(tmp.path(), 3)?;
    cfg.epochs = 0;

    let outcome = run_train(&cfg)?;
    assert!(outcome.history.epochs.is_empty());
    assert_eq!(outcome.history.best_epoch, None);
    assert!(!cfg.checkpoint.exists());
    Ok(())
}

#[test]
fn missing_mask_aborts_training() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = RunConfig {
        val_ratio: 0.0,
        ..synthetic_run(tmp.path(), 3)?
    };
    std::fs::remove_file(cfg.data_root.join("srf").join("scan_1.png"))?;

    assert!(run_train(&cfg).is_err());
    assert!(!cfg.checkpoint.exists());
    Ok(())
}

#[test]
fn eval_without_checkpoint_fails() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = synthetic_run(tmp.path(), 3)?;
    assert!(run_eval(&cfg, None).is_err());
    Ok(())
}

#[test]
fn training_needs_at_least_one_scan() {
    use burn::backend::Autodiff;
    use burn_ndarray::NdArray;
    use oct_dataset::{make_rng, LabeledDataset, LabeledRoots};

    let cfg = RunConfig {
        epochs: 1,
        base_channels: 2,
        ..Default::default()
    };
    let dataset = LabeledDataset::new(Vec::new(), LabeledRoots::from_data_root("nowhere"));
    let mut rng = make_rng(Some(1));
    let device = Default::default();
    let result = training::train::<Autodiff<NdArray<f32>>>(&cfg, &dataset, &mut rng, &device);
    assert!(result.is_err());
}

#[test]
fn bilinear_decoders_train_and_reload() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = RunConfig {
        upsampling: models::UpsamplingKind::Bilinear,
        epochs: 1,
        ..synthetic_run(tmp.path(), 4)?
    };

    let outcome = run_train(&cfg)?;
    assert_eq!(outcome.history.epochs.len(), 1);
    assert!(outcome.history.epochs[0].is_finite());
    assert!(cfg.checkpoint_path().is_file());

    let report = run_eval(&cfg, None)?;
    assert_eq!(report.samples, 1);
    Ok(())
}

#[test]
fn non_bin_checkpoint_name_is_written_as_bin() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = RunConfig {
        checkpoint: tmp.path().join("ckpt").join("model.pt"),
        epochs: 1,
        ..synthetic_run(tmp.path(), 3)?
    };

    run_train(&cfg)?;
    assert!(tmp.path().join("ckpt").join("model.bin").is_file());
    assert!(!cfg.checkpoint.exists());

    let inferred = run_infer(&cfg)?;
    assert_eq!(inferred.samples, 2);
    Ok(())
}
