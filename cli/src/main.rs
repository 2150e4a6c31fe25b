//! Geoconstruct CLI
//!
//! Load a construction problem from a JSON file, run the solver, and print
//! the result JSON to stdout. Diagnostics go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use geoconstruct_core::{load_problem, solve, SearchLimits};
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser)]
#[command(name = "geoconstruct")]
#[command(about = "Find optimal straightedge-and-compass constructions")]
struct Args {
    /// Input problem file (JSON)
    problem: String,

    /// Maximum construction depth
    #[arg(long, default_value_t = 12)]
    max_depth: u32,

    /// Maximum number of search states
    #[arg(long, default_value_t = 200_000)]
    max_states: usize,

    /// Wall-clock budget in milliseconds
    #[arg(long)]
    wall_ms: Option<u64>,
}

fn main() -> Result<()> {
    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let problem = load_problem(&args.problem)
        .with_context(|| format!("loading problem from {}", args.problem))?;
    let limits = SearchLimits {
        max_depth: args.max_depth,
        max_states: args.max_states,
        wall_ms: args.wall_ms,
    };

    tracing::info!(
        knowns = problem.knowns.len(),
        max_depth = limits.max_depth,
        max_states = limits.max_states,
        "solving"
    );

    let report = solve(&problem, limits).context("solver rejected the problem")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
