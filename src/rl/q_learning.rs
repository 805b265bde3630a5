// src/rl/q_learning.rs

//! Tabular Q-learning over a [`GraphEnvironment`].

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

use super::env::{GraphEnvironment, TransitionKind};
use crate::config::QLearningConfig;
use crate::error::SearchError;
use crate::graph::{NodeId, Path};
use crate::search::{under_cap, BestResult, Budget};

/// State-action values. States are nodes, actions are neighbor nodes.
///
/// Both levels are ordered maps, so iteration and argmax ties resolve toward
/// the lowest node id.
#[derive(Debug, Clone, Default)]
pub struct QTable {
    values: BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `state` with every action at 0 if it is not present yet.
    pub fn ensure_state(&mut self, state: NodeId, actions: &[NodeId]) {
        self.values
            .entry(state)
            .or_insert_with(|| actions.iter().map(|&a| (a, 0.0)).collect());
    }

    pub fn get(&self, state: NodeId, action: NodeId) -> Option<f64> {
        self.values.get(&state)?.get(&action).copied()
    }

    pub fn set(&mut self, state: NodeId, action: NodeId, value: f64) {
        self.values.entry(state).or_default().insert(action, value);
    }

    pub fn actions(&self, state: NodeId) -> Option<&BTreeMap<NodeId, f64>> {
        self.values.get(&state)
    }

    /// Highest-valued action; the lowest node id wins a tie.
    pub fn best_action(&self, state: NodeId) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for (&action, &value) in self.values.get(&state)? {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((action, value)),
            }
        }
        best.map(|(action, _)| action)
    }

    /// `max_a Q[state][a]`, or 0 for an unknown or empty state.
    pub fn max_value(&self, state: NodeId) -> f64 {
        self.values
            .get(&state)
            .and_then(|actions| actions.values().copied().reduce(f64::max))
            .unwrap_or(0.0)
    }

    pub fn contains_state(&self, state: NodeId) -> bool {
        self.values.contains_key(&state)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Summary of a training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub episodes: usize,
    pub steps: usize,
    /// Cheapest goal-reaching path seen during training.
    pub best_path: Option<Path>,
    pub best_cost: f64,
    pub elapsed: Duration,
}

/// Runs epsilon-greedy episodes until the budget or the episode cap runs out.
///
/// Epsilon moves linearly from `epsilon_start` to `epsilon_end` with the share
/// of the budget used. With an episode cap, the share of episodes used counts
/// too, whichever is further along.
pub fn train<R: Rng + ?Sized>(
    env: &mut GraphEnvironment<'_>,
    duration: Duration,
    config: &QLearningConfig,
    rng: &mut R,
) -> Result<(QTable, TrainingReport), SearchError> {
    let budget = Budget::start(duration);
    let mut table = QTable::new();
    let mut best = BestResult::default();
    let mut episodes = 0;
    let mut steps = 0;

    while !budget.exhausted() && under_cap(episodes, config.max_episodes) {
        let progress = match config.max_episodes {
            Some(max) if max > 0 => budget.fraction_used().max(episodes as f64 / max as f64),
            _ => budget.fraction_used(),
        };
        let epsilon = config.epsilon_start + (config.epsilon_end - config.epsilon_start) * progress;
        episodes += 1;

        let mut state = env.reset();
        let mut total_reward = 0.0;
        loop {
            let actions = env.actions(state);
            if actions.is_empty() {
                break;
            }
            table.ensure_state(state, &actions);

            let action = if rng.r#gen::<f64>() < epsilon {
                actions.choose(&mut *rng).copied()
            } else {
                table.best_action(state)
            };
            let Some(action) = action else {
                break;
            };

            let transition = env.step(action)?;
            steps += 1;
            table.ensure_state(transition.next, &env.actions(transition.next));

            let old = table.get(state, action).unwrap_or(0.0);
            let target = transition.reward + config.gamma * table.max_value(transition.next);
            table.set(state, action, old + config.alpha * (target - old));
            total_reward += transition.reward;

            if let TransitionKind::Goal { cost: Some(cost) } = transition.kind {
                if best.offer(env.path().to_vec(), cost) {
                    info!(
                        "[q_learning] episode={}, best cost={}, path={:?}",
                        episodes,
                        best.cost(),
                        best.path()
                    );
                }
            }
            if transition.done {
                break;
            }
            state = transition.next;
        }
        debug!(
            "[q_learning] episode={} epsilon={:.3} reward={}",
            episodes, epsilon, total_reward
        );
    }

    let best_cost = best.cost();
    let report = TrainingReport {
        episodes,
        steps,
        best_path: best.path().cloned(),
        best_cost,
        elapsed: budget.elapsed(),
    };
    info!(
        "[q_learning] trained: {} episodes, {} steps, {} states",
        episodes,
        steps,
        table.len()
    );
    Ok((table, report))
}

/// Greedy rollout of a learned table.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyEvaluation {
    pub path: Path,
    pub reached_goal: bool,
    /// Oracle cost of `path`, only when it reached the goal and the oracle answered.
    pub cost: Option<f64>,
}

/// Follows the argmax action from the start node.
///
/// Stops on a state missing from the table, a state with no actions, an
/// action that would close a cycle, or any terminal transition.
pub fn evaluate_policy(
    env: &mut GraphEnvironment<'_>,
    table: &QTable,
) -> Result<PolicyEvaluation, SearchError> {
    let mut state = env.reset();
    if state == env.goal() {
        let cost = env.price_path();
        return Ok(PolicyEvaluation {
            path: env.path().to_vec(),
            reached_goal: true,
            cost,
        });
    }

    loop {
        let Some(action) = table.best_action(state) else {
            break;
        };
        if env.path().contains(&action) {
            break;
        }
        let transition = env.step(action)?;
        if let TransitionKind::Goal { cost } = transition.kind {
            return Ok(PolicyEvaluation {
                path: env.path().to_vec(),
                reached_goal: true,
                cost,
            });
        }
        if transition.done {
            break;
        }
        state = transition.next;
    }

    Ok(PolicyEvaluation {
        path: env.path().to_vec(),
        reached_goal: false,
        cost: None,
    })
}
