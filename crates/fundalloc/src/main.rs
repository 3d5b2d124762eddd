use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;

use fundalloc_core::analysis::Analysis;
use fundalloc_core::dataset::PortfolioDataset;

mod input;
mod logging;
mod report;

use report::Report;

#[derive(Parser, Debug)]
#[command(name = "fundalloc")]
#[command(about = "Optimize the split of a fungible budget across country disease programs")]
struct Args {
    /// Path to the JSON input file (model results, budgets, settings)
    input: PathBuf,

    /// Write the full report as JSON to this path instead of printing a
    /// text summary
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep only the winning candidate in the report
    #[arg(long)]
    best_only: bool,

    /// Override the input file's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    logging::init_logging(&args.log_level)?;

    let mut input = input::load(&args.input)?;
    if let Some(seed) = args.seed {
        input.run.seed = seed;
    }

    let dataset = PortfolioDataset::from_observations(input.model_results, input.dataset)?;
    let objective = input.objective.build(dataset.reference_totals());
    let analysis = Analysis::new(
        dataset,
        &input.baseline_budgets,
        &input.planned_budgets,
        input.fungible_budget,
        objective,
    )?;

    let approach_a = analysis.approach_a()?;
    let approach_b = analysis.approach_b(&input.run)?;

    let mut report = Report::new(approach_a, approach_b, input.fungible_budget);
    if args.best_only {
        report = report.best_only();
    }

    match args.output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&report)?;
            fs::write(&path, json)
                .wrap_err_with(|| format!("writing report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => print!("{}", report.render_text()),
    }

    Ok(())
}
