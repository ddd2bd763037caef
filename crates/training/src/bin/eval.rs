use clap::Parser;
use cli_support::{init_tracing, validate_backend_choice, RuntimeArgs};
use std::path::PathBuf;
use training::{run_eval, RunConfig, RunOverrides};

#[derive(Parser, Debug)]
#[command(
    name = "eval",
    about = "Evaluate the best checkpoint on the validation split (SRF Jaccard per batch)"
)]
struct Args {
    #[command(flatten)]
    runtime: RuntimeArgs,
    #[command(flatten)]
    run: RunOverrides,
    /// Write a 2x2 ground-truth/prediction panel per validation scan here.
    #[arg(long)]
    panels_dir: Option<PathBuf>,
    /// Also write the report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.runtime.log_level);
    validate_backend_choice(args.runtime.backend)?;
    let cfg = RunConfig::resolve(args.runtime.config.as_deref(), &args.run)?;

    let report = run_eval(&cfg, args.panels_dir.as_deref())?;
    println!(
        "Eval complete: samples={}, mean batch SRF jaccard={:.4}",
        report.samples,
        report.mean_batch_srf_jaccard()
    );
    for (label, counts) in [("SRF", &report.srf), ("IRF", &report.irf)] {
        println!(
            "  {label}: jaccard={:.4}, dice={:.4}, precision={:.3}, recall={:.3} (tp={}, fp={}, fn={})",
            counts.jaccard(),
            counts.dice(),
            counts.precision(),
            counts.recall(),
            counts.true_pos,
            counts.false_pos,
            counts.false_neg
        );
    }
    if let Some(path) = args.report {
        training::checkpoint::write_json(&report, &path)?;
        tracing::info!(path = %path.display(), "wrote eval report");
    }
    Ok(())
}
