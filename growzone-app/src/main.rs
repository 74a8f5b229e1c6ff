use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod plotting;
mod workflow;

/// Runs a cultivation-zone scenario and writes its log, charts and summary.
#[derive(Debug, Parser)]
#[command(name = "growzone", version, about)]
struct Cli {
    /// Directory holding the strain knowledge base.
    #[arg(long, default_value = "./data/knowledge_base")]
    knowledge_base: String,

    /// Scenario YAML describing zones, devices, plantings and scheduled commands.
    #[arg(long, default_value = "./data/scenarios/basil_tent.yaml")]
    scenario: String,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 24 * 14)]
    ticks: u64,

    /// Parent directory for the timestamped run directory.
    #[arg(long, default_value = "./data/runs")]
    output_dir: String,

    /// Skip chart rendering.
    #[arg(long)]
    no_plots: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    info!(scenario = %cli.scenario, ticks = cli.ticks, "starting growzone");

    let kb = config::KnowledgeBase::load(&cli.knowledge_base)?;
    let scenario = growzone_core::scenario::load_scenario(&cli.scenario)?;

    let stem = Path::new(&cli.scenario)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scenario");
    let run_dir = format!(
        "{}/{}_{}",
        cli.output_dir,
        stem,
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create output directory: {}", run_dir))?;

    // Keep the scenario next to its results for traceability
    fs::copy(&cli.scenario, Path::new(&run_dir).join("scenario.yaml"))
        .with_context(|| format!("Failed to copy {} into {}", cli.scenario, run_dir))?;

    let output = workflow::run_scenario(scenario, &kb, &run_dir, cli.ticks)?;
    if !cli.no_plots {
        plotting::generate_all_plots(&run_dir, &output.log_path)?;
    }
    workflow::print_summary_report(&output);

    println!("\nRun complete. Results are in '{}'", run_dir);
    Ok(())
}
