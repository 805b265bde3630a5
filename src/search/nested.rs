// src/search/nested.rs

//! Nested Monte Carlo rollouts.
//!
//! Each outer iteration runs a depth-limited lookahead: at every level all
//! unvisited neighbors are tried (in shuffled order), each child is completed
//! recursively, every complete candidate is priced, and the cheapest one is
//! passed up. At depth zero the path is finished by a bounded random walk.
//!
//! The deadline is checked on entry to every level and before every branch,
//! so a run overshoots its budget by at most about one oracle call.

use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::{under_cap, BestResult, Budget, SearchOutcome, SearchProblem};
use crate::config::NestedConfig;
use crate::error::SearchError;
use crate::graph::{NodeId, Path};

/// A complete path, with its cost once it has been priced.
#[derive(Debug, Clone)]
struct Rollout {
    path: Path,
    cost: Option<f64>,
}

/// Per-run state shared by every level of the recursion.
struct NestedSearch<'p, 'a> {
    problem: &'p SearchProblem<'a>,
    budget: Budget,
    rng: StdRng,
    max_fallback_steps: usize,
    evaluations: usize,
}

impl<'p, 'a> NestedSearch<'p, 'a> {
    fn price(&mut self, path: &[NodeId]) -> Option<f64> {
        self.evaluations += 1;
        self.problem.evaluate(path).ok()
    }

    /// Extends `path` to the target, or fails when it reaches `depth` zero
    /// without a usable completion or the deadline passes.
    fn rollout(&mut self, path: Path, depth: usize) -> Option<Rollout> {
        let target = self.problem.target;
        let tail = *path.last()?;
        if tail == target {
            return Some(Rollout { path, cost: None });
        }
        if self.budget.exhausted() {
            return None;
        }
        if depth == 0 {
            return self
                .extend_randomly(path)
                .map(|path| Rollout { path, cost: None });
        }

        let mut neighbors: Vec<NodeId> = self
            .problem
            .graph
            .neighbors(tail)
            .filter(|n| !path.contains(n))
            .collect();
        neighbors.shuffle(&mut self.rng);

        let mut best: Option<Rollout> = None;
        let mut best_cost = f64::INFINITY;
        for neighbor in neighbors {
            if self.budget.exhausted() {
                break;
            }
            let mut extended = path.clone();
            extended.push(neighbor);
            let candidate = if neighbor == target {
                Rollout {
                    path: extended,
                    cost: None,
                }
            } else {
                match self.rollout(extended, depth - 1) {
                    Some(candidate) => candidate,
                    None => continue,
                }
            };
            if candidate.path.last() != Some(&target) {
                continue;
            }
            // A deeper level may already have priced this exact path.
            let cost = match candidate.cost {
                Some(cost) => cost,
                None => match self.price(&candidate.path) {
                    Some(cost) => cost,
                    None => continue,
                },
            };
            if cost < best_cost {
                best_cost = cost;
                best = Some(Rollout {
                    path: candidate.path,
                    cost: Some(cost),
                });
            }
        }
        best
    }

    /// Uncontrolled random completion, capped at `max_fallback_steps` moves.
    fn extend_randomly(&mut self, mut path: Path) -> Option<Path> {
        let target = self.problem.target;
        let mut current = *path.last()?;
        let mut steps = 0;
        while current != target {
            if self.budget.exhausted() || steps >= self.max_fallback_steps {
                return None;
            }
            let next = *self
                .problem
                .graph
                .neighbors(current)
                .filter(|n| !path.contains(n))
                .collect::<Vec<_>>()
                .choose(&mut self.rng)?;
            path.push(next);
            current = next;
            steps += 1;
        }
        Some(path)
    }
}

/// Anytime nested rollout search of depth `config.depth`.
pub fn nested_rollouts(
    problem: &SearchProblem<'_>,
    duration: Duration,
    config: &NestedConfig,
) -> Result<SearchOutcome, SearchError> {
    problem.validate()?;
    let mut search = NestedSearch {
        problem,
        budget: Budget::start(duration),
        rng: problem.rng(),
        max_fallback_steps: config.max_fallback_steps,
        evaluations: 0,
    };
    let mut best = BestResult::default();
    let mut iterations = 0;

    while !search.budget.exhausted() && under_cap(iterations, config.max_iterations) {
        iterations += 1;
        let Some(candidate) = search.rollout(vec![problem.source], config.depth) else {
            debug!("[nested] it={} produced no candidate", iterations);
            continue;
        };
        let cost = match candidate.cost {
            Some(cost) => cost,
            None => match search.price(&candidate.path) {
                Some(cost) => cost,
                None => continue,
            },
        };
        if best.offer(candidate.path, cost) {
            info!(
                "[nested] it={}, evaluations={}, best cost={}, path={:?}",
                iterations,
                search.evaluations,
                best.cost(),
                best.path()
            );
        }
    }

    info!(
        "[nested] finished: {} iterations, {} candidate evaluations",
        iterations, search.evaluations
    );
    Ok(best.into_outcome(iterations, search.evaluations, search.budget.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use rand::SeedableRng;

    use crate::error::OracleError;
    use crate::graph::Graph;
    use crate::oracle::FnOracle;

    /// Two disjoint routes 0 -> 5: short (0-1-5) and long (0-2-3-4-5).
    fn two_routes() -> Graph {
        Graph::from_edges(6, &[(0, 1), (1, 5), (0, 2), (2, 3), (3, 4), (4, 5)]).unwrap()
    }

    fn hop_count(_seed: u64, path: &[NodeId]) -> Result<f64, OracleError> {
        Ok((path.len() - 1) as f64)
    }

    #[test_log::test]
    fn test_zero_budget_yields_nothing() {
        let g = two_routes();
        let oracle = FnOracle::new(hop_count);
        let problem = SearchProblem::new(&g, 0, 5, 0, &oracle);
        let outcome =
            nested_rollouts(&problem, Duration::ZERO, &NestedConfig::default()).unwrap();
        assert_eq!(outcome.best_path, None);
        assert_eq!(outcome.best_cost, f64::INFINITY);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.evaluations, 0);
    }

    #[test_log::test]
    fn test_finds_short_route_in_one_iteration() {
        let g = two_routes();
        let oracle = FnOracle::new(hop_count);
        let problem = SearchProblem::new(&g, 0, 5, 0, &oracle);
        let config = NestedConfig {
            depth: 3,
            max_iterations: Some(1),
            ..NestedConfig::default()
        };
        let outcome = nested_rollouts(&problem, Duration::from_secs(10), &config).unwrap();
        assert_eq!(outcome.best_path, Some(vec![0, 1, 5]));
        assert_eq!(outcome.best_cost, 2.0);
        assert!(outcome.evaluations >= 2);
    }

    #[test_log::test]
    fn test_best_is_no_worse_than_any_candidate() {
        let g = Graph::random_connected(12, 0.35, &mut StdRng::seed_from_u64(21), 100).unwrap();
        let seen = RefCell::new(Vec::new());
        let oracle = FnOracle::new(|seed, path: &[NodeId]| {
            let cost = path
                .windows(2)
                .map(|w| ((w[0] * 7 + w[1] * 13 + seed as usize) % 10) as f64 + 1.0)
                .sum::<f64>();
            seen.borrow_mut().push(cost);
            Ok(cost)
        });
        let problem = SearchProblem::new(&g, 0, 11, 4, &oracle);
        let config = NestedConfig {
            depth: 2,
            max_iterations: Some(5),
            ..NestedConfig::default()
        };
        let outcome = nested_rollouts(&problem, Duration::from_secs(30), &config).unwrap();
        let seen = seen.borrow();
        assert_eq!(seen.len(), outcome.evaluations);
        assert!(!seen.is_empty());
        let cheapest = seen.iter().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(outcome.best_cost, cheapest);
        let path = outcome.best_path.unwrap();
        assert!(g.is_simple_path(&path));
        assert_eq!(path.first(), Some(&0));
        assert_eq!(path.last(), Some(&11));
    }

    #[test_log::test]
    fn test_failed_candidates_are_skipped() {
        let g = two_routes();
        // Reject the short route; only the long one can win.
        let oracle = FnOracle::new(|_, path: &[NodeId]| {
            if path.contains(&1) {
                Err(OracleError::Rejected("closed".into()))
            } else {
                Ok((path.len() - 1) as f64)
            }
        });
        let problem = SearchProblem::new(&g, 0, 5, 0, &oracle);
        let config = NestedConfig {
            depth: 1,
            max_iterations: Some(3),
            ..NestedConfig::default()
        };
        let outcome = nested_rollouts(&problem, Duration::from_secs(10), &config).unwrap();
        assert_eq!(outcome.best_path, Some(vec![0, 2, 3, 4, 5]));
        assert_eq!(outcome.best_cost, 4.0);
    }

    #[test_log::test]
    fn test_fallback_cap_blocks_long_completions() {
        let g = two_routes();
        let oracle = FnOracle::new(hop_count);
        let problem = SearchProblem::new(&g, 0, 5, 0, &oracle);
        // Depth 0 with a one-step cap: only 0 -> ... can't reach 5 in one move.
        let config = NestedConfig {
            depth: 0,
            max_fallback_steps: 1,
            max_iterations: Some(10),
        };
        let outcome = nested_rollouts(&problem, Duration::from_secs(10), &config).unwrap();
        assert!(!outcome.found());
        assert_eq!(outcome.evaluations, 0);
    }
}
