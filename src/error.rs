// src/error.rs

//! Error types for the search library.
//!
//! Oracle failures are kept apart from search failures: a strategy that sees
//! an `OracleError` drops the candidate and keeps going, while a
//! `SearchError` ends the run.

use thiserror::Error;

use crate::graph::NodeId;

/// Failure to obtain a cost from the oracle.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("cannot evaluate an empty path")]
    EmptyPath,
    #[error("failed to spawn oracle '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },
    #[error("oracle exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },
    #[error("oracle output is not valid UTF-8")]
    NonUtf8Output,
    #[error("oracle output {0:?} is not a number")]
    Unparseable(String),
    #[error("oracle returned NaN")]
    NotANumber,
    #[error("oracle rejected path: {0}")]
    Rejected(String),
}

/// Failure of a search run that cannot be absorbed by retrying.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("node {0} is not in the graph")]
    UnknownNode(NodeId),
    #[error("no viable neighbor from node {node} toward {target}")]
    NoViableNeighbor { node: NodeId, target: NodeId },
    #[error("action {action} is not valid from node {from}")]
    InvalidAction { from: NodeId, action: NodeId },
}

/// Failure to build or load a graph.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("edge ({0}, {1}) references a node outside 0..{2}")]
    EdgeOutOfRange(NodeId, NodeId, usize),
    #[error("edge probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
    #[error("no connected graph with {nodes} nodes after {attempts} attempts")]
    Disconnected { nodes: usize, attempts: usize },
}
