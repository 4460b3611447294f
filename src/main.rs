//! LOB probability runner
//!
//! Runs every scenario of an experiment file and prints the estimates.
//!
//! Usage:
//!   lobprob --config experiment.toml --trials 50000 --seed 7
//!   lobprob --write-default experiment.toml
//!
//! Environment:
//!   LOBPROB_CONFIG - Experiment file (default: built-in scenarios)
//!   RUST_LOG - Log filter (default: lobprob=info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lobprob::{ExperimentConfig, ScenarioResult};

#[derive(Parser, Debug)]
#[command(name = "lobprob")]
#[command(about = "Monte Carlo probabilities of limit order book events")]
struct Args {
    /// Experiment file (TOML)
    #[arg(short, long, env = "LOBPROB_CONFIG")]
    config: Option<PathBuf>,

    /// Trials per scenario (overrides the file)
    #[arg(short, long)]
    trials: Option<usize>,

    /// Base seed (overrides the file)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Run chunks on the current thread
    #[arg(long)]
    sequential: bool,

    /// Cap on updates per trial, 0 = unbounded
    #[arg(long)]
    max_steps: Option<u64>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log progress after every chunk
    #[arg(short, long)]
    verbose: bool,

    /// Write the built-in experiment file to this path and exit
    #[arg(long, value_name = "PATH")]
    write_default: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lobprob=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Some(path) = &args.write_default {
        ExperimentConfig::default()
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote default experiment to {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading experiment file {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    apply_overrides(&mut config, &args);

    info!(
        "Running {} scenarios, {} trials each (seed {}, {})",
        config.scenarios.len(),
        config.run.trials,
        config.run.seed,
        if config.run.parallel { "parallel" } else { "sequential" }
    );

    let results = config.run_all().context("experiment failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_table(&results);
    }
    Ok(())
}

fn apply_overrides(config: &mut ExperimentConfig, args: &Args) {
    if let Some(trials) = args.trials {
        config.run.trials = trials;
    }
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    if args.sequential {
        config.run.parallel = false;
    }
    if let Some(cap) = args.max_steps {
        config.run.max_steps = (cap > 0).then_some(cap);
    }
    if args.verbose {
        config.run.verbose = true;
    }
}

fn print_table(results: &[ScenarioResult]) {
    println!(
        "{:<20} {:>10} {:>10} {:>12} {:>10}",
        "scenario", "trials", "successes", "probability", "std_err"
    );
    for result in results {
        let report = &result.report;
        println!(
            "{:<20} {:>10} {:>10} {:>12.6} {:>10.6}",
            result.scenario, report.trials, report.successes, report.probability, report.std_error
        );
        if let Some(reach) = result.reach_probability {
            println!("{:<20} {:>45.6}", "  reach", reach);
        }
    }
}
