use burn::tensor::{Distribution, Tensor};
use burn_ndarray::NdArray;
use models::{pad_to, DualUnet, DualUnetConfig, UpsamplingKind};

type B = NdArray<f32>;

#[test]
fn repeated_forward_without_autodiff_is_identical() {
    let device = Default::default();
    let model = DualUnet::<B>::new(
        DualUnetConfig {
            base_channels: 4,
            upsampling: UpsamplingKind::Bilinear,
            ..Default::default()
        },
        &device,
    );
    let input = Tensor::<B, 4>::random([2, 1, 48, 48], Distribution::Default, &device);

    let first = model.forward(input.clone());
    let second = model.forward(input);

    let irf_a = first.irf.into_data().to_vec::<f32>().unwrap();
    let irf_b = second.irf.into_data().to_vec::<f32>().unwrap();
    assert_eq!(irf_a, irf_b);
    let srf_a = first.srf.into_data().to_vec::<f32>().unwrap();
    let srf_b = second.srf.into_data().to_vec::<f32>().unwrap();
    assert_eq!(srf_a, srf_b);
}

#[test]
fn pad_to_centers_with_zeros() {
    let device = Default::default();
    let input = Tensor::<B, 4>::ones([1, 1, 2, 2], &device);
    let padded = pad_to(input, [3, 5]);
    assert_eq!(padded.dims(), [1, 1, 3, 5]);
    let values = padded.into_data().to_vec::<f32>().unwrap();
    #[rustfmt::skip]
    let expected = vec![
        0.0, 1.0, 1.0, 0.0, 0.0,
        0.0, 1.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0,
    ];
    assert_eq!(values, expected);
}

#[test]
fn pad_to_crops_oversized_maps() {
    let device = Default::default();
    let input = Tensor::<B, 4>::ones([1, 2, 4, 4], &device);
    assert_eq!(pad_to(input, [3, 3]).dims(), [1, 2, 3, 3]);
}
