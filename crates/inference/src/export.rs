//! Grayscale panels for eyeballing predictions next to their inputs.

use crate::{InferenceError, InferenceResult};
use image::{GrayImage, Luma};
use std::fs;
use std::path::{Path, PathBuf};

/// White gutter between tiles, in pixels.
const GUTTER: u32 = 4;

/// One `[0, 1]` plane as an 8-bit image. Out-of-range values are clamped.
pub fn plane_to_gray(values: &[f32], width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let v = values
            .get((y * width + x) as usize)
            .copied()
            .unwrap_or(0.0);
        Luma([(v.clamp(0.0, 1.0) * 255.0).round() as u8])
    })
}

/// Lay equally sized tiles out row-major in a grid `cols` wide.
pub fn tile_grid(tiles: &[GrayImage], cols: u32) -> GrayImage {
    let Some(first) = tiles.first() else {
        return GrayImage::new(0, 0);
    };
    let (w, h) = first.dimensions();
    let cols = cols.max(1);
    let rows = (tiles.len() as u32).div_ceil(cols);
    let width = cols * w + (cols - 1) * GUTTER;
    let height = rows * h + (rows - 1) * GUTTER;
    let mut canvas = GrayImage::from_pixel(width, height, Luma([255]));
    for (i, tile) in tiles.iter().enumerate() {
        let (col, row) = (i as u32 % cols, i as u32 / cols);
        let x = (col * (w + GUTTER)) as i64;
        let y = (row * (h + GUTTER)) as i64;
        image::imageops::replace(&mut canvas, tile, x, y);
    }
    canvas
}

fn save(img: &GrayImage, dir: &Path, stem: &str) -> InferenceResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| InferenceError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(format!("{stem}.png"));
    img.save(&path).map_err(|source| InferenceError::Image {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Input scan, SRF prediction and IRF prediction side by side.
pub fn save_test_panel(
    dir: &Path,
    stem: &str,
    size: u32,
    scan: &[f32],
    srf_pred: &[f32],
    irf_pred: &[f32],
) -> InferenceResult<PathBuf> {
    let tiles = [scan, srf_pred, irf_pred].map(|p| plane_to_gray(p, size, size));
    save(&tile_grid(&tiles, 3), dir, stem)
}

/// 2x2 grid: SRF truth, SRF prediction / IRF truth, IRF prediction.
pub fn save_validation_panel(
    dir: &Path,
    stem: &str,
    size: u32,
    srf: (&[f32], &[f32]),
    irf: (&[f32], &[f32]),
) -> InferenceResult<PathBuf> {
    let tiles = [srf.0, srf.1, irf.0, irf.1].map(|p| plane_to_gray(p, size, size));
    save(&tile_grid(&tiles, 2), dir, stem)
}
