// src/main.rs

use std::path::PathBuf;

use anyhow::Context;
use log::{error, info, warn};

use pathprobe::{run_strategy, ProcessOracle, RunConfig, SearchProblem};

/// Runs every configured strategy on one graph and prints a JSON report per strategy.
fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    // --- Configuration ---
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            RunConfig::load(&path)?
        }
        None => {
            info!("No config file given, using defaults.");
            RunConfig::default()
        }
    }
    .with_env_overrides();

    if !config.oracle.exists() {
        warn!(
            "Oracle executable {} does not exist, every evaluation will fail",
            config.oracle.display()
        );
    }

    // --- Graph ---
    let graph = config
        .graph
        .build(config.seed)
        .context("Failed to prepare graph")?;
    let target = config
        .target
        .unwrap_or_else(|| graph.node_count().saturating_sub(1));
    info!(
        "Graph: {} nodes, {} edges (density {:.3}), source={}, target={}",
        graph.node_count(),
        graph.edge_count(),
        graph.density(),
        config.source,
        target
    );

    let oracle = ProcessOracle::new(config.oracle.clone());
    let problem = SearchProblem::new(&graph, config.source, target, config.seed, &oracle);
    let duration = config.duration();

    // --- Strategies ---
    for &strategy in &config.strategies {
        info!("Running {} (budget {:?})", strategy.label(), duration);
        match run_strategy(&problem, strategy, duration, &config.strategy) {
            Ok(outcome) => {
                let line = serde_json::to_string(&outcome.report(strategy))
                    .context("Failed to serialize strategy report")?;
                println!("{}", line);
            }
            Err(e) => error!("{} failed: {}", strategy.label(), e),
        }
    }

    info!("All strategies finished.");
    Ok(())
}
