use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::{Distribution, Tensor};
use burn_ndarray::NdArray;
use image::{GrayImage, Luma};
use inference::{run_test_inference, InferenceError, MaskPredictor, DEFAULT_THRESHOLD};
use models::{DualUnet, DualUnetConfig};
use oct_dataset::{list_image_paths, UnlabeledDataset};

type B = NdArray<f32>;

fn tiny_cfg() -> DualUnetConfig {
    DualUnetConfig {
        base_channels: 2,
        ..Default::default()
    }
}

#[test]
fn writes_one_panel_per_scan() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let scans = tmp.path().join("test_oct");
    std::fs::create_dir_all(&scans)?;
    for i in 0..3u8 {
        GrayImage::from_fn(40, 30, |x, _| Luma([x as u8 * 5 + i]))
            .save(scans.join(format!("scan_{i}.png")))?;
    }

    let device = Default::default();
    let predictor = MaskPredictor::from_model(DualUnet::<B>::new(tiny_cfg(), &device), 0.5);
    let dataset = UnlabeledDataset::with_image_size(list_image_paths(&scans)?, 32);
    let results = tmp.path().join("results");

    let report = run_test_inference(&predictor, &dataset, 2, &results, &device)?;
    assert_eq!(report.samples, 3);
    assert_eq!(report.panels.len(), 3);
    assert_eq!(report.positive_fraction.len(), 3);
    for (irf, srf) in &report.positive_fraction {
        assert!((0.0..=1.0).contains(irf) && (0.0..=1.0).contains(srf));
    }
    for (i, panel) in report.panels.iter().enumerate() {
        assert_eq!(panel, &results.join(format!("scan_{i}.png")));
        let img = image::open(panel)?.to_luma8();
        assert_eq!(img.height(), 32);
        assert!(img.width() > 3 * 32);
    }
    Ok(())
}

#[test]
fn checkpoint_round_trip_preserves_predictions() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let device = Default::default();
    let model = DualUnet::<B>::new(tiny_cfg(), &device);
    let ckpt = tmp.path().join("dual_unet.bin");
    model
        .clone()
        .save_file(&ckpt, &BinFileRecorder::<FullPrecisionSettings>::new())
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let input = Tensor::<B, 4>::random([1, 1, 32, 32], Distribution::Default, &device);
    let original = MaskPredictor::from_model(model, DEFAULT_THRESHOLD).predict(input.clone());
    let loaded = MaskPredictor::<B>::load(&ckpt, tiny_cfg(), DEFAULT_THRESHOLD, &device)?
        .predict(input);

    assert_eq!(
        original.irf.into_data().to_vec::<f32>().unwrap(),
        loaded.irf.into_data().to_vec::<f32>().unwrap()
    );
    assert_eq!(
        original.srf.into_data().to_vec::<f32>().unwrap(),
        loaded.srf.into_data().to_vec::<f32>().unwrap()
    );
    Ok(())
}

#[test]
fn missing_checkpoint_is_an_error() {
    let device = Default::default();
    let err = MaskPredictor::<B>::load(
        std::path::Path::new("does/not/exist.bin"),
        tiny_cfg(),
        DEFAULT_THRESHOLD,
        &device,
    )
    .unwrap_err();
    assert!(matches!(err, InferenceError::Checkpoint { .. }));
}
