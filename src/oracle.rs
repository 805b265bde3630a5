// src/oracle.rs

//! Cost oracle adapters.
//!
//! The oracle is the only source of path cost. Every call is synchronous and
//! may be expensive, so strategies treat each evaluation as a real charge
//! against their wall-clock budget.

use std::path::{Path as FsPath, PathBuf};
use std::process::Command;

use log::{trace, warn};

use crate::error::OracleError;
use crate::graph::NodeId;

/// Maps `(seed, path)` to a cost. The same pair must always give the same answer.
pub trait CostOracle {
    fn evaluate(&self, seed: u64, path: &[NodeId]) -> Result<f64, OracleError>;
}

impl<T: CostOracle + ?Sized> CostOracle for &T {
    fn evaluate(&self, seed: u64, path: &[NodeId]) -> Result<f64, OracleError> {
        (**self).evaluate(seed, path)
    }
}

/// Runs an external executable as `<executable> <seed> <n0,n1,...>` and
/// parses a single float from its stdout.
#[derive(Debug, Clone)]
pub struct ProcessOracle {
    executable: PathBuf,
}

impl ProcessOracle {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &FsPath {
        &self.executable
    }
}

/// Comma-separated node list as passed on the oracle command line.
pub fn format_path(path: &[NodeId]) -> String {
    path.iter()
        .map(NodeId::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses oracle stdout. Anything but a single finite-or-infinite float is a failure.
pub fn parse_cost(stdout: &str) -> Result<f64, OracleError> {
    let text = stdout.trim();
    let cost: f64 = text
        .parse()
        .map_err(|_| OracleError::Unparseable(text.to_string()))?;
    if cost.is_nan() {
        return Err(OracleError::NotANumber);
    }
    Ok(cost)
}

impl CostOracle for ProcessOracle {
    fn evaluate(&self, seed: u64, path: &[NodeId]) -> Result<f64, OracleError> {
        if path.is_empty() {
            return Err(OracleError::EmptyPath);
        }
        let path_arg = format_path(path);
        trace!(
            "Oracle call: {} {} {}",
            self.executable.display(),
            seed,
            path_arg
        );

        let result = Command::new(&self.executable)
            .arg(seed.to_string())
            .arg(&path_arg)
            .output()
            .map_err(|source| OracleError::Spawn {
                executable: self.executable.display().to_string(),
                source,
            })
            .and_then(|output| {
                if !output.status.success() {
                    return Err(OracleError::ExitStatus {
                        status: output.status.to_string(),
                        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    });
                }
                let stdout =
                    String::from_utf8(output.stdout).map_err(|_| OracleError::NonUtf8Output)?;
                parse_cost(&stdout)
            });

        match &result {
            Ok(cost) => trace!("Oracle cost for [{}]: {}", path_arg, cost),
            Err(e) => warn!("Oracle failed for [{}]: {}", path_arg, e),
        }
        result
    }
}

/// In-process oracle backed by a closure.
pub struct FnOracle<F> {
    f: F,
}

impl<F> FnOracle<F>
where
    F: Fn(u64, &[NodeId]) -> Result<f64, OracleError>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> CostOracle for FnOracle<F>
where
    F: Fn(u64, &[NodeId]) -> Result<f64, OracleError>,
{
    fn evaluate(&self, seed: u64, path: &[NodeId]) -> Result<f64, OracleError> {
        if path.is_empty() {
            return Err(OracleError::EmptyPath);
        }
        (self.f)(seed, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_format_path() {
        assert_eq!(format_path(&[17, 14, 39]), "17,14,39");
        assert_eq!(format_path(&[3]), "3");
    }

    #[test_log::test]
    fn test_parse_cost() {
        assert_eq!(parse_cost(" 12.5\n").unwrap(), 12.5);
        assert!(matches!(parse_cost("error"), Err(OracleError::Unparseable(_))));
        assert!(matches!(parse_cost(""), Err(OracleError::Unparseable(_))));
        assert!(matches!(parse_cost("NaN"), Err(OracleError::NotANumber)));
    }

    #[test_log::test]
    fn test_missing_executable_is_failure() {
        let oracle = ProcessOracle::new("/nonexistent/pathprobe-oracle");
        let err = oracle.evaluate(0, &[0, 1]).unwrap_err();
        assert!(matches!(err, OracleError::Spawn { .. }));
    }

    #[test_log::test]
    fn test_empty_path_rejected() {
        let oracle = FnOracle::new(|_, _| Ok(1.0));
        assert!(matches!(oracle.evaluate(0, &[]), Err(OracleError::EmptyPath)));
        let process = ProcessOracle::new("/bin/true");
        assert!(matches!(process.evaluate(0, &[]), Err(OracleError::EmptyPath)));
    }

    #[test_log::test]
    fn test_fn_oracle_passes_seed_and_path() {
        let oracle = FnOracle::new(|seed, path: &[NodeId]| Ok(seed as f64 + path.len() as f64));
        assert_eq!(oracle.evaluate(10, &[0, 1, 2]).unwrap(), 13.0);
    }
}
