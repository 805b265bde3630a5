// src/graph.rs

//! Undirected, unweighted graph used by every search strategy.
//!
//! Adjacency lives in ordered sets so that neighbor iteration order is stable
//! between runs. Seeded strategies rely on this to replay identically.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Node identifier.
pub type NodeId = usize;

/// Ordered node sequence. Consecutive nodes are adjacent.
pub type Path = Vec<NodeId>;

/// On-disk form of a graph: node count plus an undirected edge list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFile {
    pub nodes: usize,
    pub edges: Vec<(NodeId, NodeId)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GraphFile", into = "GraphFile")]
pub struct Graph {
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl Graph {
    /// Graph with nodes `0..nodes` and no edges.
    pub fn with_nodes(nodes: usize) -> Self {
        Self {
            adjacency: (0..nodes).map(|n| (n, BTreeSet::new())).collect(),
        }
    }

    /// Builds a graph over `0..nodes` from an undirected edge list.
    pub fn from_edges(nodes: usize, edges: &[(NodeId, NodeId)]) -> Result<Self, GraphError> {
        let mut graph = Self::with_nodes(nodes);
        for &(a, b) in edges {
            if a >= nodes || b >= nodes {
                return Err(GraphError::EdgeOutOfRange(a, b, nodes));
            }
            graph.add_edge(a, b);
        }
        Ok(graph)
    }

    /// Adds an undirected edge, creating missing endpoints. Self-loops are ignored.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            self.adjacency.entry(a).or_default();
            return;
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    /// Neighbors of `node` in ascending order. Unknown nodes have none.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.get(&node).into_iter().flatten().copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Each undirected edge once, as `(low, high)`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.adjacency
            .iter()
            .flat_map(|(&a, adj)| adj.range(a + 1..).map(move |&b| (a, b)))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.adjacency.contains_key(&node)
    }

    pub fn contains_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency.get(&a).is_some_and(|adj| adj.contains(&b))
    }

    /// Fraction of possible edges present.
    pub fn density(&self) -> f64 {
        let n = self.node_count() as f64;
        if n < 2.0 {
            return 0.0;
        }
        self.edge_count() as f64 / (n * (n - 1.0) / 2.0)
    }

    /// Hop distance from every node that can reach `target`.
    pub fn hops_to(&self, target: NodeId) -> BTreeMap<NodeId, usize> {
        let mut dist = BTreeMap::new();
        if !self.contains_node(target) {
            return dist;
        }
        let mut queue = VecDeque::from([target]);
        dist.insert(target, 0);
        while let Some(node) = queue.pop_front() {
            let d = dist[&node];
            for next in self.neighbors(node) {
                if !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    /// Shortest hop count between two nodes, `None` when unreachable.
    pub fn shortest_hops(&self, from: NodeId, to: NodeId) -> Option<usize> {
        self.hops_to(to).get(&from).copied()
    }

    /// Fewest-hop path from `from` to `to` that never enters a node in `avoid`.
    pub fn path_avoiding(
        &self,
        from: NodeId,
        to: NodeId,
        avoid: &BTreeSet<NodeId>,
    ) -> Option<Path> {
        if !self.contains_node(from) || avoid.contains(&from) {
            return None;
        }
        let mut parent = BTreeMap::from([(from, from)]);
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            if node == to {
                let mut path = vec![to];
                let mut current = to;
                while current != from {
                    current = parent[&current];
                    path.push(current);
                }
                path.reverse();
                return Some(path);
            }
            for next in self.neighbors(node) {
                if !avoid.contains(&next) && !parent.contains_key(&next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    pub fn is_connected(&self) -> bool {
        match self.nodes().next() {
            Some(first) => self.hops_to(first).len() == self.node_count(),
            None => true,
        }
    }

    /// Samples G(n, p) graphs until one is connected.
    pub fn random_connected<R: Rng + ?Sized>(
        nodes: usize,
        edge_probability: f64,
        rng: &mut R,
        max_attempts: usize,
    ) -> Result<Self, GraphError> {
        if !(0.0..=1.0).contains(&edge_probability) {
            return Err(GraphError::InvalidProbability(edge_probability));
        }
        for attempt in 1..=max_attempts {
            let mut graph = Self::with_nodes(nodes);
            for a in 0..nodes {
                for b in a + 1..nodes {
                    if rng.r#gen::<f64>() < edge_probability {
                        graph.add_edge(a, b);
                    }
                }
            }
            if graph.is_connected() {
                debug!(
                    "Generated connected graph: {} nodes, {} edges (attempt {})",
                    nodes,
                    graph.edge_count(),
                    attempt
                );
                return Ok(graph);
            }
            debug!("Graph attempt {} is disconnected, resampling", attempt);
        }
        Err(GraphError::Disconnected {
            nodes,
            attempts: max_attempts,
        })
    }

    /// True when `path` is non-empty, walks existing edges and repeats no node.
    pub fn is_simple_path(&self, path: &[NodeId]) -> bool {
        let Some(&first) = path.first() else {
            return false;
        };
        let mut seen = BTreeSet::from([first]);
        path.windows(2)
            .all(|w| self.contains_edge(w[0], w[1]) && seen.insert(w[1]))
            && self.contains_node(first)
    }
}

impl TryFrom<GraphFile> for Graph {
    type Error = GraphError;

    fn try_from(file: GraphFile) -> Result<Self, Self::Error> {
        Self::from_edges(file.nodes, &file.edges)
    }
}

impl From<Graph> for GraphFile {
    fn from(graph: Graph) -> Self {
        GraphFile {
            nodes: graph.node_count(),
            edges: graph.edges().collect(),
        }
    }
}
