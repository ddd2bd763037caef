//! Dataset loading, splitting, and Burn-compatible batching for OCT scans.
//!
//! This crate provides utilities for:
//! - Loading grayscale scans and their IRF/SRF masks from parallel directories
//! - Normalizing intensities and binarizing masks
//! - Listing and train/val splitting file names
//! - Burn-compatible batch iteration with per-epoch shuffling

pub mod batch;
pub mod loader;
pub mod splits;
pub mod types;

pub use batch::{
    stack_planes, BatchIter, LabeledBatch, LabeledDataset, SampleSource, UnlabeledBatch,
    UnlabeledDataset,
};
pub use loader::{binarize, load_labeled, load_unlabeled, normalize_u8, read_mask, read_plane};
pub use splits::{list_image_names, list_image_paths, make_rng, split_names};
pub use types::*;
