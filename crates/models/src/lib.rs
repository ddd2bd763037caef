//! Burn segmentation models for retinal OCT scans.
//!
//! This crate defines the network used to segment fluid lesions:
//! - `DualUnet`: shared convolutional encoder feeding two independent
//!   decoders, one emitting intraretinal fluid (IRF) logits and one emitting
//!   subretinal fluid (SRF) logits at the input resolution.
//! - `Upsampler`: the decoder's resolution-restoring step, either a learned
//!   transposed convolution or bilinear interpolation, chosen once at
//!   construction.
//!
//! These are pure Burn modules with no knowledge of datasets, losses or
//! checkpoints. The `training` and `inference` crates drive them.

pub mod blocks;
pub mod unet;
pub mod upsample;

pub use blocks::{DoubleConv, Down, OutConv};
pub use unet::{
    Decoder, DualLogits, DualUnet, DualUnetConfig, Encoder, EncoderFeatures, UpStage,
};
pub use upsample::{
    centered_padding, pad_to, BilinearUpsampler, LearnedUpsampler, Upsample, Upsampler,
    UpsamplingKind,
};

pub mod prelude {
    pub use super::{DualLogits, DualUnet, DualUnetConfig, UpsamplingKind};
}
