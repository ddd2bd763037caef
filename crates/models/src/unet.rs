use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::blocks::{DoubleConv, Down, OutConv};
use crate::upsample::{pad_to, Upsample, Upsampler, UpsamplingKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualUnetConfig {
    pub in_channels: usize,
    pub num_classes: usize,
    /// Width of the stem; each encoder stage doubles it.
    pub base_channels: usize,
    pub upsampling: UpsamplingKind,
}

impl Default for DualUnetConfig {
    fn default() -> Self {
        Self {
            in_channels: 1,
            num_classes: 1,
            base_channels: 64,
            upsampling: UpsamplingKind::Learned,
        }
    }
}

/// Upsample, realign with the skip connection, concatenate, fuse.
#[derive(Debug, Module)]
pub struct UpStage<B: Backend> {
    up: Upsampler<B>,
    conv: DoubleConv<B>,
}

impl<B: Backend> UpStage<B> {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kind: UpsamplingKind,
        device: &B::Device,
    ) -> Self {
        let up = Upsampler::new(kind, in_channels, device);
        let conv = match kind {
            UpsamplingKind::Learned => DoubleConv::new(in_channels, out_channels, None, device),
            UpsamplingKind::Bilinear => {
                DoubleConv::new(in_channels, out_channels, Some(in_channels / 2), device)
            }
        };
        Self { up, conv }
    }

    pub fn forward(&self, input: Tensor<B, 4>, skip: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.align(input, &skip);
        self.conv.forward(Tensor::cat(vec![skip, x], 1))
    }

    /// Upsampled map padded to the skip's spatial size, before concatenation.
    pub fn align(&self, input: Tensor<B, 4>, skip: &Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, height, width] = skip.dims();
        pad_to(self.up.upsample(input), [height, width])
    }
}

/// Encoder activations kept for the decoders: the four skip maps from the
/// shallowest (stem) to the deepest, then the bottleneck.
#[derive(Debug, Clone)]
pub struct EncoderFeatures<B: Backend> {
    pub skips: [Tensor<B, 4>; 4],
    pub bottleneck: Tensor<B, 4>,
}

#[derive(Debug, Module)]
pub struct Encoder<B: Backend> {
    stem: DoubleConv<B>,
    down1: Down<B>,
    down2: Down<B>,
    down3: Down<B>,
    down4: Down<B>,
}

impl<B: Backend> Encoder<B> {
    pub fn new(cfg: &DualUnetConfig, device: &B::Device) -> Self {
        let c = cfg.base_channels;
        let factor = cfg.upsampling.factor();
        Self {
            stem: DoubleConv::new(cfg.in_channels, c, None, device),
            down1: Down::new(c, c * 2, device),
            down2: Down::new(c * 2, c * 4, device),
            down3: Down::new(c * 4, c * 8, device),
            down4: Down::new(c * 8, c * 16 / factor, device),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> EncoderFeatures<B> {
        let x1 = self.stem.forward(input);
        let x2 = self.down1.forward(x1.clone());
        let x3 = self.down2.forward(x2.clone());
        let x4 = self.down3.forward(x3.clone());
        let x5 = self.down4.forward(x4.clone());
        EncoderFeatures {
            skips: [x1, x2, x3, x4],
            bottleneck: x5,
        }
    }
}

#[derive(Debug, Module)]
pub struct Decoder<B: Backend> {
    up1: UpStage<B>,
    up2: UpStage<B>,
    up3: UpStage<B>,
    up4: UpStage<B>,
    head: OutConv<B>,
}

impl<B: Backend> Decoder<B> {
    pub fn new(cfg: &DualUnetConfig, device: &B::Device) -> Self {
        let c = cfg.base_channels;
        let factor = cfg.upsampling.factor();
        let kind = cfg.upsampling;
        Self {
            up1: UpStage::new(c * 16, c * 8 / factor, kind, device),
            up2: UpStage::new(c * 8, c * 4 / factor, kind, device),
            up3: UpStage::new(c * 4, c * 2 / factor, kind, device),
            up4: UpStage::new(c * 2, c, kind, device),
            head: OutConv::new(c, cfg.num_classes, device),
        }
    }

    pub fn forward(&self, features: &EncoderFeatures<B>) -> Tensor<B, 4> {
        let [x1, x2, x3, x4] = features.skips.clone();
        let x = self.up1.forward(features.bottleneck.clone(), x4);
        let x = self.up2.forward(x, x3);
        let x = self.up3.forward(x, x2);
        let x = self.up4.forward(x, x1);
        self.head.forward(x)
    }

    /// Decoder stages in application order, deepest first.
    pub fn stages(&self) -> [&UpStage<B>; 4] {
        [&self.up1, &self.up2, &self.up3, &self.up4]
    }
}

/// Raw per-pixel scores from both heads, `[N, num_classes, H, W]` each.
#[derive(Debug, Clone)]
pub struct DualLogits<B: Backend> {
    pub irf: Tensor<B, 4>,
    pub srf: Tensor<B, 4>,
}

/// U-Net with one shared encoder and two independent decoders, one per
/// fluid type (intraretinal, subretinal).
#[derive(Debug, Module)]
pub struct DualUnet<B: Backend> {
    encoder: Encoder<B>,
    irf_decoder: Decoder<B>,
    srf_decoder: Decoder<B>,
}

impl<B: Backend> DualUnet<B> {
    pub fn new(cfg: DualUnetConfig, device: &B::Device) -> Self {
        Self {
            encoder: Encoder::new(&cfg, device),
            irf_decoder: Decoder::new(&cfg, device),
            srf_decoder: Decoder::new(&cfg, device),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> DualLogits<B> {
        let features = self.encoder.forward(input);
        DualLogits {
            irf: self.irf_decoder.forward(&features),
            srf: self.srf_decoder.forward(&features),
        }
    }

    pub fn encoder(&self) -> &Encoder<B> {
        &self.encoder
    }

    pub fn irf_decoder(&self) -> &Decoder<B> {
        &self.irf_decoder
    }

    pub fn srf_decoder(&self) -> &Decoder<B> {
        &self.srf_decoder
    }
}
