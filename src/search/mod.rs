// src/search/mod.rs

//! Anytime path search against a cost oracle.
//!
//! Every strategy takes a [`SearchProblem`] and produces a [`SearchOutcome`].
//! The time-bounded ones poll a [`Budget`] at their loop heads and keep the
//! cheapest evaluated path in a [`BestResult`], so stopping them at any point
//! still yields the best path seen so far.
//!
//! | Strategy | Generator | Bounded by |
//! |----------|-----------|------------|
//! | `baseline` | completion walk per neighbor | path length |
//! | `monte_carlo` | uniform random walk | wall clock |
//! | `exploration` | visit-memory weighted walk | wall clock |
//! | `nested` | recursive rollouts of depth D | wall clock |
//! | `q_learning` | epsilon-greedy episodes | wall clock |

pub mod baseline;
pub mod monte_carlo;
pub mod nested;
pub mod walk;

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::error::{OracleError, SearchError};
use crate::graph::{Graph, NodeId, Path};
use crate::oracle::CostOracle;

pub use baseline::baseline;
pub use monte_carlo::{exploration_monte_carlo, monte_carlo};
pub use nested::nested_rollouts;
pub use walk::{completion_walk, random_walk, weighted_random_walk, VisitMemory};

/// One search request: where to go, on which graph, priced by which oracle.
#[derive(Clone, Copy)]
pub struct SearchProblem<'a> {
    pub graph: &'a Graph,
    pub source: NodeId,
    pub target: NodeId,
    /// Passed to the oracle and used to seed the run's random generator.
    pub seed: u64,
    pub oracle: &'a dyn CostOracle,
}

impl<'a> SearchProblem<'a> {
    pub fn new(
        graph: &'a Graph,
        source: NodeId,
        target: NodeId,
        seed: u64,
        oracle: &'a dyn CostOracle,
    ) -> Self {
        Self {
            graph,
            source,
            target,
            seed,
            oracle,
        }
    }

    /// Checks that both endpoints exist in the graph.
    pub fn validate(&self) -> Result<(), SearchError> {
        for node in [self.source, self.target] {
            if !self.graph.contains_node(node) {
                return Err(SearchError::UnknownNode(node));
            }
        }
        Ok(())
    }

    /// Fresh generator for one run. Two runs of the same problem replay identically.
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    pub fn evaluate(&self, path: &[NodeId]) -> Result<f64, OracleError> {
        self.oracle.evaluate(self.seed, path)
    }
}

/// Wall-clock deadline of one run.
#[derive(Clone, Copy, Debug)]
pub struct Budget {
    start: Instant,
    duration: Duration,
}

impl Budget {
    pub fn start(duration: Duration) -> Self {
        Self {
            start: Instant::now(),
            duration,
        }
    }

    pub fn exhausted(&self) -> bool {
        self.start.elapsed() >= self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Share of the budget used so far, in `[0, 1]`.
    pub fn fraction_used(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.start.elapsed().as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

/// Cheapest evaluated path so far. Starts empty at `+inf`.
#[derive(Debug, Clone)]
pub struct BestResult {
    path: Option<Path>,
    cost: f64,
}

impl Default for BestResult {
    fn default() -> Self {
        Self {
            path: None,
            cost: f64::INFINITY,
        }
    }
}

impl BestResult {
    /// Keeps `path` if `cost` is strictly lower than the current best.
    pub fn offer(&mut self, path: Path, cost: f64) -> bool {
        if cost < self.cost {
            self.cost = cost;
            self.path = Some(path);
            true
        } else {
            false
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn into_outcome(self, iterations: usize, evaluations: usize, elapsed: Duration) -> SearchOutcome {
        SearchOutcome {
            best_path: self.path,
            best_cost: self.cost,
            iterations,
            evaluations,
            elapsed,
        }
    }
}

/// Result of one strategy run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_path: Option<Path>,
    /// `+inf` when no complete path was evaluated successfully.
    pub best_cost: f64,
    /// Outer-loop iterations (steps for the baseline, episodes for Q-learning).
    pub iterations: usize,
    /// Oracle calls made.
    pub evaluations: usize,
    pub elapsed: Duration,
}

impl SearchOutcome {
    pub fn found(&self) -> bool {
        self.best_path.is_some() && self.best_cost.is_finite()
    }

    pub fn report(&self, strategy: Strategy) -> StrategyReport {
        StrategyReport {
            strategy,
            best_cost: self.best_cost.is_finite().then_some(self.best_cost),
            best_path: self.best_path.clone(),
            iterations: self.iterations,
            evaluations: self.evaluations,
            elapsed_secs: self.elapsed.as_secs_f64(),
        }
    }
}

/// Serializable summary of a run, one per strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub best_cost: Option<f64>,
    pub best_path: Option<Path>,
    pub iterations: usize,
    pub evaluations: usize,
    pub elapsed_secs: f64,
}

/// Available search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Baseline,
    MonteCarlo,
    Exploration,
    Nested,
    QLearning,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Baseline,
        Strategy::MonteCarlo,
        Strategy::Exploration,
        Strategy::Nested,
        Strategy::QLearning,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Baseline => "baseline",
            Strategy::MonteCarlo => "monte_carlo",
            Strategy::Exploration => "exploration",
            Strategy::Nested => "nested",
            Strategy::QLearning => "q_learning",
        }
    }

    /// Everything but the baseline stops on the wall clock.
    pub fn is_time_bounded(self) -> bool {
        !matches!(self, Strategy::Baseline)
    }
}

/// Runs one strategy. The baseline ignores `duration`.
pub fn run_strategy(
    problem: &SearchProblem<'_>,
    strategy: Strategy,
    duration: Duration,
    config: &StrategyConfig,
) -> Result<SearchOutcome, SearchError> {
    match strategy {
        Strategy::Baseline => baseline(problem, &config.baseline),
        Strategy::MonteCarlo => monte_carlo(problem, duration, &config.monte_carlo),
        Strategy::Exploration => exploration_monte_carlo(problem, duration, &config.exploration),
        Strategy::Nested => nested_rollouts(problem, duration, &config.nested),
        Strategy::QLearning => crate::rl::q_learning(problem, duration, &config.q_learning),
    }
}

/// True while `count` is below an optional cap.
pub(crate) fn under_cap(count: usize, cap: Option<usize>) -> bool {
    cap.map_or(true, |max| count < max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_best_result_keeps_strict_improvements() {
        let mut best = BestResult::default();
        assert!(best.path().is_none());
        assert_eq!(best.cost(), f64::INFINITY);
        assert!(best.offer(vec![0, 1], 5.0));
        assert!(!best.offer(vec![0, 2], 5.0));
        assert!(!best.offer(vec![0, 3], 7.0));
        assert!(best.offer(vec![0, 4], 2.0));
        assert_eq!(best.path(), Some(&vec![0, 4]));
    }

    #[test_log::test]
    fn test_infinite_cost_never_accepted() {
        let mut best = BestResult::default();
        assert!(!best.offer(vec![0], f64::INFINITY));
        assert!(best.path().is_none());
    }

    #[test_log::test]
    fn test_zero_budget_is_exhausted() {
        let budget = Budget::start(Duration::ZERO);
        assert!(budget.exhausted());
        assert_eq!(budget.fraction_used(), 1.0);
    }

    #[test_log::test]
    fn test_report_drops_infinite_cost() {
        let outcome = BestResult::default().into_outcome(0, 0, Duration::ZERO);
        assert!(!outcome.found());
        let report = outcome.report(Strategy::Nested);
        assert_eq!(report.best_cost, None);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""strategy":"nested""#));
    }

    #[test_log::test]
    fn test_strategy_labels_match_serde_names() {
        for strategy in Strategy::ALL {
            let json = serde_json::to_string(&strategy).unwrap();
            assert_eq!(json, format!("\"{}\"", strategy.label()));
        }
        assert!(!Strategy::Baseline.is_time_bounded());
        assert!(Strategy::QLearning.is_time_bounded());
    }
}
