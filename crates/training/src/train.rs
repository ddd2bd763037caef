use crate::checkpoint::{save_checkpoint, BestLossTracker, LossHistory};
use crate::config::RunConfig;
use crate::loss::dice_loss;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use models::DualUnet;
use oct_dataset::{LabeledDataset, SampleSource};
use rand::rngs::StdRng;
use std::time::Instant;

pub const ADAM_EPSILON: f32 = 1e-8;

/// Adam with default betas and a 1e-8 epsilon (Burn's own default is 1e-5).
pub fn optimizer_config() -> AdamConfig {
    AdamConfig::new().with_epsilon(ADAM_EPSILON)
}

/// Weights after the last epoch plus the per-epoch losses.
///
/// The checkpoint on disk holds the best epoch, which is not necessarily
/// the model returned here.
#[derive(Debug)]
pub struct TrainOutcome<B: AutodiffBackend> {
    pub model: DualUnet<B>,
    pub history: LossHistory,
}

/// Train a fresh network for `cfg.epochs` epochs.
///
/// Each batch runs forward, sums the IRF and SRF Dice losses, backpropagates
/// and takes one Adam step. The epoch loss is the sum of its batch losses;
/// whenever it beats every earlier epoch the checkpoint at `cfg.checkpoint`
/// is overwritten (as [`RunConfig::checkpoint_path`]).
pub fn train<B: AutodiffBackend>(
    cfg: &RunConfig,
    dataset: &LabeledDataset,
    rng: &mut StdRng,
    device: &B::Device,
) -> anyhow::Result<TrainOutcome<B>> {
    if dataset.is_empty() {
        anyhow::bail!("no training samples under {}", dataset.roots().oct.display());
    }

    let mut model = DualUnet::<B>::new(cfg.model_config(), device);
    let mut optim = optimizer_config().init();
    let mut tracker = BestLossTracker::new();
    let mut history = LossHistory::default();

    for epoch in 0..cfg.epochs {
        let started = Instant::now();
        let mut epoch_loss = 0.0f64;
        let mut batches = 0usize;

        let mut iter = dataset.batches(cfg.batch_size, Some(&mut *rng));
        while let Some(batch) = iter.next_batch::<B>(device)? {
            let logits = model.forward(batch.images);
            let loss = dice_loss(logits.irf, batch.irf) + dice_loss(logits.srf, batch.srf);
            let loss_value = loss.clone().into_scalar().elem::<f64>();

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.learning_rate, model, grads);

            epoch_loss += loss_value;
            batches += 1;
        }

        history.epochs.push(epoch_loss);
        let improved = tracker.observe(epoch, epoch_loss)?;
        if improved {
            save_checkpoint(&model, &cfg.checkpoint_path())?;
        }
        tracing::info!(
            epoch,
            loss = epoch_loss,
            batches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            checkpoint = improved,
            "epoch complete"
        );
    }

    if let Some((epoch, loss)) = tracker.best() {
        history.best_epoch = Some(epoch);
        history.best_loss = Some(loss);
        tracing::info!(
            best_epoch = epoch,
            best_loss = loss,
            checkpoint = %cfg.checkpoint_path().display(),
            "training finished"
        );
    }
    Ok(TrainOutcome { model, history })
}
