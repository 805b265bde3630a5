// src/rl/mod.rs

//! Reinforcement learning strategy: a navigation environment over the graph
//! and a tabular Q-learner trained against it.

pub mod env;
pub mod q_learning;


use std::time::{Duration, Instant};

use log::info;

use crate::config::QLearningConfig;
use crate::error::SearchError;
use crate::search::{SearchOutcome, SearchProblem};

pub use env::{GraphEnvironment, Transition, TransitionKind};
pub use q_learning::{evaluate_policy, train, PolicyEvaluation, QTable, TrainingReport};

/// Trains for `duration`, then reports the greedy policy's path.
///
/// The outcome carries a cost only when the greedy path reaches the goal and
/// the oracle prices it; a policy that stops short reports no path. Paths met
/// while exploring stay in the training log. `iterations` counts training
/// episodes. With no episode trained there is no policy to roll out.
pub fn q_learning(
    problem: &SearchProblem<'_>,
    duration: Duration,
    config: &QLearningConfig,
) -> Result<SearchOutcome, SearchError> {
    let start = Instant::now();
    let mut env = GraphEnvironment::new(*problem, config)?;
    let mut rng = problem.rng();
    let (table, report) = train(&mut env, duration, config, &mut rng)?;
    info!(
        "[q_learning] training best cost={}, path={:?}",
        report.best_cost, report.best_path
    );

    let mut outcome = SearchOutcome {
        best_path: None,
        best_cost: f64::INFINITY,
        iterations: report.episodes,
        evaluations: 0,
        elapsed: Duration::ZERO,
    };
    if report.episodes > 0 {
        let policy = evaluate_policy(&mut env, &table)?;
        info!(
            "[q_learning] greedy policy: reached={}, cost={:?}, path={:?}",
            policy.reached_goal, policy.cost, policy.path
        );
        if policy.reached_goal {
            outcome.best_cost = policy.cost.unwrap_or(f64::INFINITY);
            outcome.best_path = Some(policy.path);
        }
    }

    outcome.evaluations = env.evaluations();
    outcome.elapsed = start.elapsed();
    Ok(outcome)
}
