// src/rl/env.rs

//! Graph navigation environment.
//!
//! The agent walks from the problem's source toward its target one neighbor
//! at a time. Moving onto an already visited node, or onto a node from which
//! no simple path can still fit in the graph, ends the episode with a
//! penalty and leaves the state untouched. Reaching the target prices the
//! walked path with the oracle.

use std::collections::{BTreeMap, BTreeSet};

use log::trace;

use crate::config::QLearningConfig;
use crate::error::SearchError;
use crate::graph::{NodeId, Path};
use crate::search::SearchProblem;

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionKind {
    /// Moved onto a fresh node that is not the goal.
    Advanced,
    /// Tried to enter a node already on the path.
    Revisit,
    /// The goal can no longer be reached by a simple path through the action.
    Overlength,
    /// Reached the goal. `cost` is `None` when the oracle failed.
    Goal { cost: Option<f64> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: NodeId,
    pub reward: f64,
    pub done: bool,
    pub kind: TransitionKind,
}

pub struct GraphEnvironment<'a> {
    problem: SearchProblem<'a>,
    revisit_penalty: f64,
    overlength_penalty: f64,
    failure_reward: f64,
    /// Hop distance of every node to the goal; missing means unreachable.
    hops: BTreeMap<NodeId, usize>,
    path: Path,
    visited: BTreeSet<NodeId>,
    evaluations: usize,
}

impl<'a> GraphEnvironment<'a> {
    pub fn new(problem: SearchProblem<'a>, config: &QLearningConfig) -> Result<Self, SearchError> {
        problem.validate()?;
        let hops = problem.graph.hops_to(problem.target);
        Ok(Self {
            problem,
            revisit_penalty: config.revisit_penalty,
            overlength_penalty: config.overlength_penalty,
            failure_reward: config.failure_reward,
            hops,
            path: vec![problem.source],
            visited: BTreeSet::from([problem.source]),
            evaluations: 0,
        })
    }

    /// Starts a new episode and returns the start node.
    pub fn reset(&mut self) -> NodeId {
        self.path.clear();
        self.path.push(self.problem.source);
        self.visited.clear();
        self.visited.insert(self.problem.source);
        self.problem.source
    }

    pub fn current(&self) -> NodeId {
        *self.path.last().unwrap_or(&self.problem.source)
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn goal(&self) -> NodeId {
        self.problem.target
    }

    /// Oracle calls made since construction.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn actions(&self, node: NodeId) -> Vec<NodeId> {
        self.problem.graph.neighbors(node).collect()
    }

    /// Applies `action` from the current node.
    pub fn step(&mut self, action: NodeId) -> Result<Transition, SearchError> {
        let current = self.current();
        if !self.problem.graph.contains_edge(current, action) {
            return Err(SearchError::InvalidAction {
                from: current,
                action,
            });
        }

        if self.visited.contains(&action) {
            trace!("[env] revisit {} -> {}", current, action);
            return Ok(self.stay(current, -self.revisit_penalty, TransitionKind::Revisit));
        }

        let fits = self
            .hops
            .get(&action)
            .is_some_and(|&hops| self.path.len() + 1 + hops <= self.problem.graph.node_count());
        if !fits {
            trace!("[env] overlength {} -> {}", current, action);
            return Ok(self.stay(current, -self.overlength_penalty, TransitionKind::Overlength));
        }

        self.path.push(action);
        self.visited.insert(action);

        if action == self.problem.target {
            let cost = self.price_path();
            let reward = match cost {
                Some(cost) if cost != 0.0 => 1.0 / cost,
                _ => self.failure_reward,
            };
            return Ok(Transition {
                next: action,
                reward,
                done: true,
                kind: TransitionKind::Goal { cost },
            });
        }

        Ok(Transition {
            next: action,
            reward: 0.0,
            done: false,
            kind: TransitionKind::Advanced,
        })
    }

    /// Prices the current path. `None` when the oracle fails.
    pub fn price_path(&mut self) -> Option<f64> {
        self.evaluations += 1;
        self.problem.evaluate(&self.path).ok()
    }

    fn stay(&self, current: NodeId, reward: f64, kind: TransitionKind) -> Transition {
        Transition {
            next: current,
            reward,
            done: true,
            kind,
        }
    }
}
