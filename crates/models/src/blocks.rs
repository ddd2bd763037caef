//! Convolutional building blocks shared by the encoder and both decoders.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// (3x3 conv => batch norm => ReLU) twice. Convolutions carry no bias since
/// the following normalization re-centers the activations anyway.
#[derive(Debug, Module)]
pub struct DoubleConv<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    norm2: BatchNorm<B, 2>,
}

impl<B: Backend> DoubleConv<B> {
    /// `mid_channels` defaults to `out_channels` when `None`.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        mid_channels: Option<usize>,
        device: &B::Device,
    ) -> Self {
        let mid_channels = mid_channels.unwrap_or(out_channels);
        let conv1 = conv3x3(in_channels, mid_channels, device);
        let norm1 = BatchNormConfig::new(mid_channels).init(device);
        let conv2 = conv3x3(mid_channels, out_channels, device);
        let norm2 = BatchNormConfig::new(out_channels).init(device);
        Self {
            conv1,
            norm1,
            conv2,
            norm2,
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.norm1.forward(self.conv1.forward(input)));
        relu(self.norm2.forward(self.conv2.forward(x)))
    }
}

fn conv3x3<B: Backend>(in_channels: usize, out_channels: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([in_channels, out_channels], [3, 3])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_bias(false)
        .init(device)
}

/// Halves the spatial resolution with a 2x2 max-pool, then applies a [`DoubleConv`].
#[derive(Debug, Module)]
pub struct Down<B: Backend> {
    pool: MaxPool2d,
    conv: DoubleConv<B>,
}

impl<B: Backend> Down<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let conv = DoubleConv::new(in_channels, out_channels, None, device);
        Self { pool, conv }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.conv.forward(self.pool.forward(input))
    }
}

/// 1x1 projection from decoder features to per-class logits.
#[derive(Debug, Module)]
pub struct OutConv<B: Backend> {
    conv: Conv2d<B>,
}

impl<B: Backend> OutConv<B> {
    pub fn new(in_channels: usize, num_classes: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, num_classes], [1, 1]).init(device);
        Self { conv }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.conv.forward(input)
    }
}
