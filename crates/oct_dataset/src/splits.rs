//! Directory listing and train/validation splitting.

use crate::types::{DatasetError, DatasetResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};

/// Seeded generator when `seed` is set, otherwise seeded from the thread RNG.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Sorted file names (not paths) of the regular files directly under `dir`.
pub fn list_image_names(dir: &Path) -> DatasetResult<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|source| DatasetError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DatasetError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
            names.push(name.to_string());
        }
    }
    if names.is_empty() {
        return Err(DatasetError::EmptyDirectory {
            dir: dir.to_path_buf(),
        });
    }
    names.sort();
    Ok(names)
}

/// Full paths of the files returned by [`list_image_names`].
pub fn list_image_paths(dir: &Path) -> DatasetResult<Vec<PathBuf>> {
    Ok(list_image_names(dir)?
        .into_iter()
        .map(|name| dir.join(name))
        .collect())
}

/// Shuffle and hold out `ceil(val_ratio * n)` names for validation.
/// Returns `(train, val)`.
pub fn split_names(
    mut names: Vec<String>,
    val_ratio: f32,
    rng: &mut StdRng,
) -> (Vec<String>, Vec<String>) {
    names.shuffle(rng);
    let n_val = if val_ratio <= 0.0 {
        0
    } else {
        ((val_ratio.min(1.0) * names.len() as f32).ceil() as usize).min(names.len())
    };
    let train = names.split_off(n_val);
    (train, names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("scan_{i:03}.png")).collect()
    }

    #[test]
    fn holds_out_ceiling_of_ratio() {
        let mut rng = make_rng(Some(7));
        let (train, val) = split_names(names(25), 0.1, &mut rng);
        assert_eq!(val.len(), 3);
        assert_eq!(train.len(), 22);
    }

    #[test]
    fn split_is_a_partition() {
        let mut rng = make_rng(Some(1));
        let (train, val) = split_names(names(10), 0.3, &mut rng);
        let mut all: Vec<String> = train.into_iter().chain(val).collect();
        all.sort();
        assert_eq!(all, names(10));
    }

    #[test]
    fn zero_ratio_keeps_everything_for_training() {
        let mut rng = make_rng(None);
        let (train, val) = split_names(names(4), 0.0, &mut rng);
        assert_eq!(train.len(), 4);
        assert!(val.is_empty());
    }

    #[test]
    fn same_seed_same_split() {
        let a = split_names(names(20), 0.2, &mut make_rng(Some(42)));
        let b = split_names(names(20), 0.2, &mut make_rng(Some(42)));
        assert_eq!(a, b);
    }
}
