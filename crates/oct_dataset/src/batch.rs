//! Batch iteration for training, validation and test inference.

use crate::loader::{load_labeled, load_unlabeled};
use crate::types::{
    DatasetResult, LabeledRoots, LabeledSample, Plane, UnlabeledSample, IMAGE_SIZE,
};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

/// Anything that can load its `index`-th sample independently of the others.
pub trait SampleSource: Sync {
    type Sample: Send;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load(&self, index: usize) -> DatasetResult<Self::Sample>;

    /// Iterate in index order, or in a fresh random order when `rng` is given.
    fn batches(&self, batch_size: usize, rng: Option<&mut StdRng>) -> BatchIter<'_, Self>
    where
        Self: Sized,
    {
        BatchIter::new(self, batch_size, rng)
    }
}

/// File names shared by the `oct`, `irf` and `srf` roots.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    names: Vec<String>,
    roots: LabeledRoots,
    image_size: u32,
}

impl LabeledDataset {
    pub fn new(names: Vec<String>, roots: LabeledRoots) -> Self {
        Self::with_image_size(names, roots, IMAGE_SIZE)
    }

    pub fn with_image_size(names: Vec<String>, roots: LabeledRoots, image_size: u32) -> Self {
        Self {
            names,
            roots,
            image_size,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn roots(&self) -> &LabeledRoots {
        &self.roots
    }

    pub fn image_size(&self) -> u32 {
        self.image_size
    }
}

impl SampleSource for LabeledDataset {
    type Sample = LabeledSample;

    fn len(&self) -> usize {
        self.names.len()
    }

    fn load(&self, index: usize) -> DatasetResult<LabeledSample> {
        load_labeled(&self.names[index], &self.roots, self.image_size)
    }
}

/// Scans without ground truth, addressed by full path.
#[derive(Debug, Clone)]
pub struct UnlabeledDataset {
    paths: Vec<PathBuf>,
    image_size: u32,
}

impl UnlabeledDataset {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self::with_image_size(paths, IMAGE_SIZE)
    }

    pub fn with_image_size(paths: Vec<PathBuf>, image_size: u32) -> Self {
        Self { paths, image_size }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl SampleSource for UnlabeledDataset {
    type Sample = UnlabeledSample;

    fn len(&self) -> usize {
        self.paths.len()
    }

    fn load(&self, index: usize) -> DatasetResult<UnlabeledSample> {
        load_unlabeled(&self.paths[index], self.image_size)
    }
}

/// Scans and both masks as `[N, 1, H, W]` tensors.
#[derive(Debug, Clone)]
pub struct LabeledBatch<B: Backend> {
    pub images: Tensor<B, 4>,
    pub irf: Tensor<B, 4>,
    pub srf: Tensor<B, 4>,
    pub names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UnlabeledBatch<B: Backend> {
    pub images: Tensor<B, 4>,
    pub paths: Vec<PathBuf>,
}

pub struct BatchIter<'a, S: SampleSource> {
    source: &'a S,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
}

impl<'a, S: SampleSource> BatchIter<'a, S> {
    pub fn new(source: &'a S, batch_size: usize, rng: Option<&mut StdRng>) -> Self {
        let mut order: Vec<usize> = (0..source.len()).collect();
        if let Some(rng) = rng {
            order.shuffle(rng);
        }
        Self {
            source,
            order,
            cursor: 0,
            batch_size: batch_size.max(1),
        }
    }

    /// Sample indices in the order this iterator yields them.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Number of batches still to come.
    pub fn remaining_batches(&self) -> usize {
        (self.order.len() - self.cursor).div_ceil(self.batch_size)
    }

    /// Load the next group of samples in parallel, preserving order.
    /// The first failing sample aborts the batch.
    pub fn next_samples(&mut self) -> DatasetResult<Option<Vec<S::Sample>>> {
        if self.cursor >= self.order.len() {
            return Ok(None);
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let slice = &self.order[self.cursor..end];
        self.cursor = end;

        let started = Instant::now();
        let samples = slice
            .par_iter()
            .map(|&idx| self.source.load(idx))
            .collect::<DatasetResult<Vec<_>>>()?;
        tracing::debug!(
            samples = samples.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded batch"
        );
        Ok(Some(samples))
    }
}

impl BatchIter<'_, LabeledDataset> {
    pub fn next_batch<B: Backend>(
        &mut self,
        device: &B::Device,
    ) -> DatasetResult<Option<LabeledBatch<B>>> {
        let Some(samples) = self.next_samples()? else {
            return Ok(None);
        };
        let images = stack_planes::<B>(samples.iter().map(|s| &s.image), device);
        let irf = stack_planes::<B>(samples.iter().map(|s| &s.irf), device);
        let srf = stack_planes::<B>(samples.iter().map(|s| &s.srf), device);
        let names = samples.into_iter().map(|s| s.name).collect();
        Ok(Some(LabeledBatch {
            images,
            irf,
            srf,
            names,
        }))
    }
}

impl BatchIter<'_, UnlabeledDataset> {
    pub fn next_batch<B: Backend>(
        &mut self,
        device: &B::Device,
    ) -> DatasetResult<Option<UnlabeledBatch<B>>> {
        let Some(samples) = self.next_samples()? else {
            return Ok(None);
        };
        let images = stack_planes::<B>(samples.iter().map(|s| &s.image), device);
        let paths = samples.into_iter().map(|s| s.path).collect();
        Ok(Some(UnlabeledBatch { images, paths }))
    }
}

/// Stack equally sized planes into a `[N, 1, size, size]` tensor.
pub fn stack_planes<'p, B: Backend>(
    planes: impl ExactSizeIterator<Item = &'p Plane>,
    device: &B::Device,
) -> Tensor<B, 4> {
    let batch = planes.len();
    let mut size = 0usize;
    let mut buf = Vec::new();
    for plane in planes {
        size = plane.size as usize;
        buf.extend_from_slice(&plane.values);
    }
    Tensor::<B, 4>::from_data(TensorData::new(buf, [batch, 1, size, size]), device)
}
