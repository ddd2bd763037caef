//! Core types, error definitions, and data structures for oct_dataset.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Side length every scan and mask is resized to.
pub const IMAGE_SIZE: u32 = 224;
/// Normalized intensity at or above which a mask pixel counts as lesion.
pub const MASK_THRESHOLD: f32 = 0.5;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image file missing: {path}")]
    MissingFile { path: PathBuf },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image at {path} has zero width or height")]
    EmptyImage { path: PathBuf },
    #[error("no image files found in {dir}")]
    EmptyDirectory { dir: PathBuf },
}

/// A single-channel `size x size` plane, row-major, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub size: u32,
    pub values: Vec<f32>,
}

impl Plane {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A scan with its intraretinal and subretinal fluid masks.
#[derive(Debug, Clone)]
pub struct LabeledSample {
    pub name: String,
    pub image: Plane,
    pub irf: Plane,
    pub srf: Plane,
}

/// A scan without ground truth, identified by its path.
#[derive(Debug, Clone)]
pub struct UnlabeledSample {
    pub path: PathBuf,
    pub image: Plane,
}

/// Three parallel directories holding identically named files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRoots {
    pub oct: PathBuf,
    pub irf: PathBuf,
    pub srf: PathBuf,
}

impl LabeledRoots {
    /// `<root>/oct`, `<root>/irf`, `<root>/srf`.
    pub fn from_data_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            oct: root.join("oct"),
            irf: root.join("irf"),
            srf: root.join("srf"),
        }
    }
}
