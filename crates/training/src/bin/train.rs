use clap::Parser;
use cli_support::{init_tracing, validate_backend_choice, RuntimeArgs};
use training::{run_train, RunConfig, RunOverrides};

#[derive(Parser, Debug)]
#[command(
    name = "train",
    about = "Train the dual-head U-Net on labeled OCT scans (Dice loss, best-loss checkpoint)"
)]
struct Args {
    #[command(flatten)]
    runtime: RuntimeArgs,
    #[command(flatten)]
    run: RunOverrides,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.runtime.log_level);
    validate_backend_choice(args.runtime.backend)?;
    let cfg = RunConfig::resolve(args.runtime.config.as_deref(), &args.run)?;

    let outcome = run_train(&cfg)?;
    match (outcome.history.best_epoch, outcome.history.best_loss) {
        (Some(epoch), Some(loss)) => tracing::info!(
            epochs = outcome.history.epochs.len(),
            best_epoch = epoch,
            best_loss = loss,
            checkpoint = %cfg.checkpoint_path().display(),
            "done"
        ),
        _ => tracing::warn!("no epochs ran; checkpoint not written"),
    }
    Ok(())
}
