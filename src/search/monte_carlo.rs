// src/search/monte_carlo.rs

//! Flat Monte Carlo rollouts: sample a full path, price it, keep the best.

use std::time::Duration;

use log::{debug, info};

use super::walk::{random_walk, weighted_random_walk, VisitMemory};
use super::{under_cap, BestResult, Budget, SearchOutcome, SearchProblem};
use crate::config::{ExplorationConfig, MonteCarloConfig};
use crate::error::SearchError;

/// Classic Monte Carlo: uniform random walks until the budget runs out.
///
/// Walks that dead-end still count as an iteration but never reach the oracle.
pub fn monte_carlo(
    problem: &SearchProblem<'_>,
    duration: Duration,
    config: &MonteCarloConfig,
) -> Result<SearchOutcome, SearchError> {
    problem.validate()?;
    let budget = Budget::start(duration);
    let mut rng = problem.rng();
    let mut best = BestResult::default();
    let mut iterations = 0;
    let mut evaluations = 0;

    while !budget.exhausted() && under_cap(iterations, config.max_iterations) {
        iterations += 1;
        let Some(path) = random_walk(problem.graph, problem.source, problem.target, &mut rng)
        else {
            continue;
        };
        evaluations += 1;
        if let Ok(cost) = problem.evaluate(&path) {
            debug!("[monte_carlo] it={} cost={}", iterations, cost);
            if best.offer(path, cost) {
                info!(
                    "[monte_carlo] it={}, best cost={}, path={:?}",
                    iterations,
                    best.cost(),
                    best.path()
                );
            }
        }
    }

    info!(
        "[monte_carlo] finished: {} iterations, {} evaluations",
        iterations, evaluations
    );
    Ok(best.into_outcome(iterations, evaluations, budget.elapsed()))
}

/// Monte Carlo with visit memory: each priced path raises the weight of its
/// edges by `1 + cost * alpha`, so later walks drift toward edges that have
/// not yet shown up on expensive paths.
pub fn exploration_monte_carlo(
    problem: &SearchProblem<'_>,
    duration: Duration,
    config: &ExplorationConfig,
) -> Result<SearchOutcome, SearchError> {
    exploration_monte_carlo_with_memory(problem, duration, config).map(|(outcome, _)| outcome)
}

/// Same as [`exploration_monte_carlo`], also handing back the final memory.
pub fn exploration_monte_carlo_with_memory(
    problem: &SearchProblem<'_>,
    duration: Duration,
    config: &ExplorationConfig,
) -> Result<(SearchOutcome, VisitMemory), SearchError> {
    problem.validate()?;
    let budget = Budget::start(duration);
    let mut rng = problem.rng();
    let mut memory = VisitMemory::new(config.initial_weight);
    let mut best = BestResult::default();
    let mut iterations = 0;
    let mut evaluations = 0;

    while !budget.exhausted() && under_cap(iterations, config.max_iterations) {
        iterations += 1;
        let Some(path) = weighted_random_walk(
            problem.graph,
            problem.source,
            problem.target,
            &memory,
            config.epsilon,
            &mut rng,
        ) else {
            continue;
        };
        evaluations += 1;
        let Ok(cost) = problem.evaluate(&path) else {
            continue;
        };
        memory.penalize(&path, cost, config.alpha);
        if best.offer(path, cost) {
            info!(
                "[exploration] it={}, best cost={}, path={:?}",
                iterations,
                best.cost(),
                best.path()
            );
        }
    }

    info!(
        "[exploration] finished: {} iterations, {} evaluations, {} edges penalized",
        iterations,
        evaluations,
        memory.len()
    );
    Ok((best.into_outcome(iterations, evaluations, budget.elapsed()), memory))
}
