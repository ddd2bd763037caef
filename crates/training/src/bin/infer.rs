use clap::Parser;
use cli_support::{init_tracing, validate_backend_choice, RuntimeArgs};
use training::{run_infer, RunConfig, RunOverrides};

#[derive(Parser, Debug)]
#[command(
    name = "infer",
    about = "Predict IRF/SRF masks for unlabeled scans and save side-by-side panels"
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

    let report = run_infer(&cfg)?;
    println!(
        "Wrote {} panels to {}",
        report.panels.len(),
        cfg.results_dir.display()
    );
    Ok(())
}
