// src/config.rs

//! Configuration for search runs.
//!
//! Every struct deserializes from JSON with `#[serde(default)]`, so a config
//! file only needs to mention the values it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::graph::{Graph, NodeId};
use crate::search::Strategy;

/// Environment variable that overrides the oracle executable.
pub const ORACLE_ENV_VAR: &str = "PATHPROBE_ORACLE";

// --- Top-Level Run Configuration ---

/// Everything the driver needs to run a batch of strategies on one graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Where the graph comes from.
    pub graph: GraphSource,
    pub source: NodeId,
    /// Target node. `None` means the highest node id.
    pub target: Option<NodeId>,
    /// Seeds both the oracle and the per-run random generator.
    pub seed: u64,
    /// Wall-clock budget per time-bounded strategy, in seconds.
    pub duration_secs: f64,
    /// Path to the oracle executable.
    pub oracle: PathBuf,
    /// Strategies to run, in order.
    pub strategies: Vec<Strategy>,
    /// Per-strategy tuning.
    pub strategy: StrategyConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            graph: GraphSource::default(),
            source: 0,
            target: None,
            seed: 0,
            duration_secs: 5.0,
            oracle: PathBuf::from("./blackbox"),
            strategies: Strategy::ALL.to_vec(),
            strategy: StrategyConfig::default(),
        }
    }
}

impl RunConfig {
    /// Reads a JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Applies environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(oracle) = std::env::var(ORACLE_ENV_VAR) {
            self.oracle = PathBuf::from(oracle);
        }
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Graph supplier for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GraphSource {
    /// JSON file in the `{ "nodes": n, "edges": [[a, b], ...] }` shape.
    File { path: PathBuf },
    /// Connected G(n, p) graph sampled from the run seed.
    Random {
        nodes: usize,
        edge_probability: f64,
        #[serde(default = "default_max_attempts")]
        max_attempts: usize,
    },
}

fn default_max_attempts() -> usize {
    1000
}

impl GraphSource {
    /// Loads or samples the graph. Random graphs are drawn from `seed`.
    pub fn build(&self, seed: u64) -> anyhow::Result<Graph> {
        match self {
            GraphSource::File { path } => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read graph file {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse graph file {}", path.display()))
            }
            GraphSource::Random {
                nodes,
                edge_probability,
                max_attempts,
            } => {
                let mut rng = StdRng::seed_from_u64(seed);
                Graph::random_connected(*nodes, *edge_probability, &mut rng, *max_attempts)
                    .context("Failed to generate random graph")
            }
        }
    }
}

impl Default for GraphSource {
    fn default() -> Self {
        GraphSource::Random {
            nodes: 50,
            edge_probability: 0.3,
            max_attempts: default_max_attempts(),
        }
    }
}

// --- Strategy Configuration ---

/// Tuning for every strategy, grouped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub baseline: BaselineConfig,
    pub monte_carlo: MonteCarloConfig,
    pub exploration: ExplorationConfig,
    pub nested: NestedConfig,
    pub q_learning: QLearningConfig,
}

/// Greedy one-hop lookahead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Step cap for each sampled completion walk. `0` means four times the node count.
    pub max_walk_steps: usize,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        BaselineConfig { max_walk_steps: 0 }
    }
}

/// Plain Monte Carlo rollouts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Stop after this many iterations even if time remains.
    pub max_iterations: Option<usize>,
}

/// Memory-weighted exploratory rollouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// Cost scale in the per-edge penalty `1 + cost * alpha`.
    pub alpha: f64,
    /// Added to edge weights before inverting, avoids division by zero.
    pub epsilon: f64,
    /// Starting weight of every directed edge.
    pub initial_weight: f64,
    pub max_iterations: Option<usize>,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        ExplorationConfig {
            alpha: 100.0,
            epsilon: 1e-6,
            initial_weight: 1.0,
            max_iterations: None,
        }
    }
}

/// Nested recursive rollouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedConfig {
    /// Recursion depth. Higher depth means more oracle calls per iteration.
    pub depth: usize,
    /// Step cap of the random completion used at depth zero.
    pub max_fallback_steps: usize,
    pub max_iterations: Option<usize>,
}

impl Default for NestedConfig {
    fn default() -> Self {
        NestedConfig {
            depth: 3,
            max_fallback_steps: 50,
            max_iterations: None,
        }
    }
}

/// Tabular Q-learning and its environment's reward shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Exploration rate at the start of training.
    pub epsilon_start: f64,
    /// Exploration rate at the end of training.
    pub epsilon_end: f64,
    pub revisit_penalty: f64,
    pub overlength_penalty: f64,
    /// Reward when the goal is reached but the oracle fails.
    pub failure_reward: f64,
    pub max_episodes: Option<usize>,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        QLearningConfig {
            alpha: 0.2,
            gamma: 0.9,
            epsilon_start: 0.9,
            epsilon_end: 0.1,
            revisit_penalty: 50.0,
            overlength_penalty: 100.0,
            failure_reward: -100.0,
            max_episodes: None,
        }
    }
}
