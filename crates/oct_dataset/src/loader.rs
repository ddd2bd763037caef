//! Reading scans and masks from disk into normalized planes.

use crate::types::{
    DatasetError, DatasetResult, LabeledRoots, LabeledSample, Plane, UnlabeledSample,
    MASK_THRESHOLD,
};
use image::imageops::FilterType;
use image::GrayImage;
use std::path::Path;

/// Map 8-bit intensities onto [0, 1].
pub fn normalize_u8(pixels: &[u8]) -> Vec<f32> {
    pixels.iter().map(|&p| p as f32 / 255.0).collect()
}

/// Values at or above `threshold` become 1.0, everything else 0.0.
pub fn binarize(values: &mut [f32], threshold: f32) {
    for v in values.iter_mut() {
        *v = if *v >= threshold { 1.0 } else { 0.0 };
    }
}

/// Decode `path` as grayscale, resize to `size x size` and normalize.
pub fn read_plane(path: &Path, size: u32) -> DatasetResult<Plane> {
    if !path.is_file() {
        return Err(DatasetError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let img = image::open(path)
        .map_err(|source| DatasetError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_luma8();
    if img.width() == 0 || img.height() == 0 {
        return Err(DatasetError::EmptyImage {
            path: path.to_path_buf(),
        });
    }
    let img: GrayImage = if img.dimensions() == (size, size) {
        img
    } else {
        image::imageops::resize(&img, size, size, FilterType::Triangle)
    };
    Ok(Plane {
        size,
        values: normalize_u8(img.as_raw()),
    })
}

/// Like [`read_plane`], then thresholded at [`MASK_THRESHOLD`].
pub fn read_mask(path: &Path, size: u32) -> DatasetResult<Plane> {
    let mut plane = read_plane(path, size)?;
    binarize(&mut plane.values, MASK_THRESHOLD);
    Ok(plane)
}

/// Load `name` from each of the three labeled roots.
pub fn load_labeled(name: &str, roots: &LabeledRoots, size: u32) -> DatasetResult<LabeledSample> {
    Ok(LabeledSample {
        name: name.to_string(),
        image: read_plane(&roots.oct.join(name), size)?,
        irf: read_mask(&roots.irf.join(name), size)?,
        srf: read_mask(&roots.srf.join(name), size)?,
    })
}

pub fn load_unlabeled(path: &Path, size: u32) -> DatasetResult<UnlabeledSample> {
    Ok(UnlabeledSample {
        path: path.to_path_buf(),
        image: read_plane(path, size)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_covers_extremes() {
        assert_eq!(normalize_u8(&[0, 255]), vec![0.0, 1.0]);
        let mid = normalize_u8(&[128])[0];
        assert!(mid > 0.5 && mid < 0.51);
    }

    #[test]
    fn binarize_is_idempotent() {
        let mut values = vec![0.0, 0.49, 0.5, 0.51, 1.0];
        binarize(&mut values, MASK_THRESHOLD);
        assert_eq!(values, vec![0.0, 0.0, 1.0, 1.0, 1.0]);
        let once = values.clone();
        binarize(&mut values, MASK_THRESHOLD);
        assert_eq!(values, once);
    }
}
