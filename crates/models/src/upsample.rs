//! Decoder upsampling: learned transposed convolution or fixed bilinear
//! interpolation, plus the centered padding that realigns an upsampled map
//! with its skip connection.

use burn::module::Module;
use burn::nn::conv::{ConvTranspose2d, ConvTranspose2dConfig};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use serde::{Deserialize, Serialize};

/// How the decoders restore spatial resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsamplingKind {
    /// 2x2 transposed convolution with stride 2.
    #[default]
    Learned,
    /// Parameter-free bilinear interpolation.
    Bilinear,
}

impl UpsamplingKind {
    /// Channel divisor applied to the deepest encoder stage and the decoder outputs.
    /// Bilinear upsampling keeps the channel count, so the budget is halved up front.
    pub fn factor(self) -> usize {
        match self {
            UpsamplingKind::Learned => 1,
            UpsamplingKind::Bilinear => 2,
        }
    }
}

/// Doubles the spatial resolution of a `[N, C, H, W]` feature map.
pub trait Upsample<B: Backend> {
    fn upsample(&self, input: Tensor<B, 4>) -> Tensor<B, 4>;
}

#[derive(Debug, Module)]
pub struct LearnedUpsampler<B: Backend> {
    deconv: ConvTranspose2d<B>,
}

impl<B: Backend> LearnedUpsampler<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let deconv = ConvTranspose2dConfig::new([in_channels, out_channels], [2, 2])
            .with_stride([2, 2])
            .init(device);
        Self { deconv }
    }
}

impl<B: Backend> Upsample<B> for LearnedUpsampler<B> {
    fn upsample(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.deconv.forward(input)
    }
}

/// Align-corners bilinear x2 upsampling, computed as `A_h · x · A_wᵀ` with
/// fixed interpolation matrices.
#[derive(Debug, Clone, Default, Module)]
pub struct BilinearUpsampler;

impl<B: Backend> Upsample<B> for BilinearUpsampler {
    fn upsample(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, height, width] = input.dims();
        let device = input.device();
        let rows = interpolation_matrix::<B>(height, height * 2, &device)
            .unsqueeze::<4>()
            .expand([batch, channels, height * 2, height]);
        let cols = interpolation_matrix::<B>(width, width * 2, &device)
            .transpose()
            .unsqueeze::<4>()
            .expand([batch, channels, width, width * 2]);
        rows.matmul(input.matmul(cols))
    }
}

/// `[to, from]` weights of 1-D linear interpolation with aligned corners:
/// output `i` samples input position `i * (from - 1) / (to - 1)`.
pub fn interpolation_weights(from: usize, to: usize) -> Vec<f32> {
    let mut weights = vec![0.0f32; to * from];
    if from == 0 {
        return weights;
    }
    let scale = if to > 1 && from > 1 {
        (from - 1) as f64 / (to - 1) as f64
    } else {
        0.0
    };
    for i in 0..to {
        let src = i as f64 * scale;
        let lo = (src.floor() as usize).min(from - 1);
        let hi = (lo + 1).min(from - 1);
        let frac = (src - lo as f64) as f32;
        weights[i * from + lo] += 1.0 - frac;
        weights[i * from + hi] += frac;
    }
    weights
}

fn interpolation_matrix<B: Backend>(from: usize, to: usize, device: &B::Device) -> Tensor<B, 2> {
    Tensor::from_data(
        TensorData::new(interpolation_weights(from, to), [to, from]),
        device,
    )
}

/// The upsampling variant picked when a decoder stage is built.
#[derive(Debug, Module)]
pub enum Upsampler<B: Backend> {
    Learned(LearnedUpsampler<B>),
    Bilinear(BilinearUpsampler),
}

impl<B: Backend> Upsampler<B> {
    /// Learned variant maps `in_channels -> in_channels / 2`; bilinear keeps channels.
    pub fn new(kind: UpsamplingKind, in_channels: usize, device: &B::Device) -> Self {
        match kind {
            UpsamplingKind::Learned => {
                Upsampler::Learned(LearnedUpsampler::new(in_channels, in_channels / 2, device))
            }
            UpsamplingKind::Bilinear => Upsampler::Bilinear(BilinearUpsampler),
        }
    }
}

impl<B: Backend> Upsample<B> for Upsampler<B> {
    fn upsample(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Upsampler::Learned(up) => up.upsample(input),
            Upsampler::Bilinear(up) => Upsample::<B>::upsample(up, input),
        }
    }
}

/// Per-side padding `(left, right, top, bottom)` that centers a `from` sized map
/// inside a `to` sized one. Odd differences put the extra row/column on the
/// trailing side. Negative entries mean the map is larger and must be cropped.
pub fn centered_padding(from: [usize; 2], to: [usize; 2]) -> (isize, isize, isize, isize) {
    let diff_y = to[0] as isize - from[0] as isize;
    let diff_x = to[1] as isize - from[1] as isize;
    let top = diff_y.div_euclid(2);
    let left = diff_x.div_euclid(2);
    (left, diff_x - left, top, diff_y - top)
}

/// Pads (or crops) the spatial dims of `input` so they equal `target` exactly.
pub fn pad_to<B: Backend>(input: Tensor<B, 4>, target: [usize; 2]) -> Tensor<B, 4> {
    let [batch, channels, height, width] = input.dims();
    if [height, width] == target {
        return input;
    }
    let (left, right, top, bottom) = centered_padding([height, width], target);

    // Crop first when the map overshoots the target along an axis.
    let crop = |v: isize| (-v).max(0) as usize;
    let (crop_l, crop_r, crop_t, crop_b) = (crop(left), crop(right), crop(top), crop(bottom));
    let input = if crop_l + crop_r + crop_t + crop_b > 0 {
        input.slice([
            0..batch,
            0..channels,
            crop_t..height - crop_b,
            crop_l..width - crop_r,
        ])
    } else {
        input
    };

    let grow = |v: isize| v.max(0) as usize;
    input.pad((grow(left), grow(right), grow(top), grow(bottom)), 0.0)
}
