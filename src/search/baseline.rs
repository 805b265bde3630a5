// src/search/baseline.rs

//! Greedy one-hop lookahead baseline.
//!
//! Walks from source to target one committed step at a time. When the next
//! step is not forced, each candidate neighbor is scored by pricing one
//! random completion through it, and the cheapest neighbor wins. When no
//! candidate could be priced, the first neighbor that still reaches the target
//! is taken. Unlike the rollout strategies there is nothing to fall back on,
//! so a node with no way forward is an error here.

use std::collections::BTreeSet;
use std::time::Instant;

use log::{debug, info};

use super::walk::completion_walk;
use super::{SearchOutcome, SearchProblem};
use crate::config::BaselineConfig;
use crate::error::SearchError;
use crate::graph::NodeId;

pub fn baseline(
    problem: &SearchProblem<'_>,
    config: &BaselineConfig,
) -> Result<SearchOutcome, SearchError> {
    problem.validate()?;
    let start = Instant::now();
    let graph = problem.graph;
    let target = problem.target;
    let mut rng = problem.rng();
    let max_walk_steps = match config.max_walk_steps {
        0 => graph.node_count().max(1) * 4,
        n => n,
    };

    let mut path = vec![problem.source];
    let mut on_path = BTreeSet::from([problem.source]);
    let mut current = problem.source;
    let mut evaluations = 0;

    while current != target {
        let viable: Vec<NodeId> = graph
            .neighbors(current)
            .filter(|n| !on_path.contains(n))
            .collect();

        let next = match viable.as_slice() {
            [] => return Err(SearchError::NoViableNeighbor { node: current, target }),
            [only] => *only,
            _ if viable.contains(&target) => target,
            _ => {
                let mut best_neighbor = None;
                let mut best_cost = f64::INFINITY;
                let mut reachable = None;
                for &neighbor in &viable {
                    // A capped walk that gives up falls back on the shortest detour.
                    let completion = completion_walk(
                        graph,
                        neighbor,
                        target,
                        Some(current),
                        &on_path,
                        max_walk_steps,
                        &mut rng,
                    )
                    .or_else(|| {
                        debug!("[baseline] walk through {} gave up, using shortest detour", neighbor);
                        graph.path_avoiding(neighbor, target, &on_path)
                    });
                    let Some(completion) = completion else {
                        debug!("[baseline] target unreachable through {}", neighbor);
                        continue;
                    };
                    reachable.get_or_insert(neighbor);
                    let mut candidate = path.clone();
                    candidate.extend(completion);
                    evaluations += 1;
                    if let Ok(cost) = problem.evaluate(&candidate) {
                        debug!("[baseline] {} -> {}: sampled cost {}", current, neighbor, cost);
                        if cost < best_cost {
                            best_cost = cost;
                            best_neighbor = Some(neighbor);
                        }
                    }
                }
                best_neighbor
                    .or(reachable)
                    .ok_or(SearchError::NoViableNeighbor { node: current, target })?
            }
        };

        path.push(next);
        on_path.insert(next);
        current = next;
    }

    evaluations += 1;
    let best_cost = problem.evaluate(&path).unwrap_or(f64::INFINITY);
    info!(
        "[baseline] finished: cost={}, path={:?}, {} evaluations",
        best_cost, path, evaluations
    );
    Ok(SearchOutcome {
        iterations: path.len() - 1,
        best_path: Some(path),
        best_cost,
        evaluations,
        elapsed: start.elapsed(),
    })
}
