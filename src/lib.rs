// src/lib.rs

//! Anytime minimum-cost path search over graphs whose path cost is only
//! available from an external cost oracle.

pub mod config;
pub mod error;
pub mod graph;
pub mod oracle;
pub mod rl;
pub mod search;

pub use config::{RunConfig, StrategyConfig};
pub use error::{GraphError, OracleError, SearchError};
pub use graph::{Graph, NodeId, Path};
pub use oracle::{CostOracle, FnOracle, ProcessOracle};
pub use search::{run_strategy, SearchOutcome, SearchProblem, Strategy, StrategyReport};
