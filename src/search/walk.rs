// src/search/walk.rs

//! Random path generators.
//!
//! Each generator returns `None` instead of failing when it walks into a
//! dead end. A returned path is always simple and runs source to target.

use std::collections::{BTreeSet, HashMap};

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::{Graph, NodeId, Path};

/// Walks from `source`, picking uniformly among unvisited neighbors.
pub fn random_walk<R: Rng + ?Sized>(
    graph: &Graph,
    source: NodeId,
    target: NodeId,
    rng: &mut R,
) -> Option<Path> {
    walk(graph, source, target, |_, candidates| {
        candidates.choose(&mut *rng).copied()
    })
}

/// Walks from `source`, picking unvisited neighbors with probability
/// proportional to `1 / (memory[edge] + epsilon)`.
pub fn weighted_random_walk<R: Rng + ?Sized>(
    graph: &Graph,
    source: NodeId,
    target: NodeId,
    memory: &VisitMemory,
    epsilon: f64,
    rng: &mut R,
) -> Option<Path> {
    walk(graph, source, target, |current, candidates| {
        let weights: Vec<f64> = candidates
            .iter()
            .map(|&next| 1.0 / (memory.weight(current, next) + epsilon))
            .collect();
        let index = WeightedIndex::new(&weights).ok()?;
        Some(candidates[index.sample(&mut *rng)])
    })
}

/// Shared walk loop: `choose` picks the next node among unvisited neighbors.
fn walk<F>(graph: &Graph, source: NodeId, target: NodeId, mut choose: F) -> Option<Path>
where
    F: FnMut(NodeId, &[NodeId]) -> Option<NodeId>,
{
    let mut path = vec![source];
    let mut visited = BTreeSet::from([source]);
    let mut current = source;
    while current != target {
        let candidates: Vec<NodeId> = graph
            .neighbors(current)
            .filter(|n| !visited.contains(n))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let next = choose(current, &candidates)?;
        path.push(next);
        visited.insert(next);
        current = next;
    }
    Some(path)
}

/// Completion walk for the greedy baseline.
///
/// Never enters a node in `avoid`, does not step straight back to the node it
/// came from unless that is the only way on, and jumps to `target` as soon as
/// it is adjacent. Loops are erased as they form, so the returned path is
/// simple. Gives up after `max_steps` moves.
pub fn completion_walk<R: Rng + ?Sized>(
    graph: &Graph,
    start: NodeId,
    target: NodeId,
    came_from: Option<NodeId>,
    avoid: &BTreeSet<NodeId>,
    max_steps: usize,
    rng: &mut R,
) -> Option<Path> {
    let mut path = vec![start];
    let mut previous = came_from;
    let mut current = start;
    let mut steps = 0;

    while current != target {
        if steps >= max_steps {
            return None;
        }
        steps += 1;

        let mut options: Vec<NodeId> = graph
            .neighbors(current)
            .filter(|n| !avoid.contains(n))
            .collect();
        if let Some(prev) = previous {
            if options.len() > 1 {
                options.retain(|&n| n != prev);
            }
        }

        let next = if options.contains(&target) {
            target
        } else {
            *options.choose(rng)?
        };

        match path.iter().position(|&n| n == next) {
            Some(pos) => path.truncate(pos + 1),
            None => path.push(next),
        }
        previous = Some(current);
        current = next;
    }
    Some(path)
}

/// Per directed edge weight that steers the weighted walk away from edges
/// seen on expensive paths.
#[derive(Debug, Clone)]
pub struct VisitMemory {
    weights: HashMap<(NodeId, NodeId), f64>,
    initial: f64,
}

impl Default for VisitMemory {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl VisitMemory {
    pub fn new(initial: f64) -> Self {
        Self {
            weights: HashMap::new(),
            initial,
        }
    }

    pub fn weight(&self, from: NodeId, to: NodeId) -> f64 {
        self.weights.get(&(from, to)).copied().unwrap_or(self.initial)
    }

    /// Penalty charged to each edge of a path of the given cost.
    ///
    /// Floored at zero so weights never shrink when the oracle reports a
    /// negative cost.
    pub fn penalty(cost: f64, alpha: f64) -> f64 {
        (1.0 + cost * alpha).max(0.0)
    }

    /// Adds the cost-proportional penalty to every edge traversed by `path`.
    pub fn penalize(&mut self, path: &[NodeId], cost: f64, alpha: f64) {
        let penalty = Self::penalty(cost, alpha);
        for edge in path.windows(2) {
            *self
                .weights
                .entry((edge[0], edge[1]))
                .or_insert(self.initial) += penalty;
        }
    }

    /// Number of edges that have been penalized at least once.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
