// tests/strategies.rs

//! End-to-end runs of every strategy through the public API.

use std::time::Duration;

use pathprobe::config::{GraphSource, NestedConfig};
use pathprobe::error::OracleError;
use pathprobe::{run_strategy, FnOracle, Graph, NodeId, SearchProblem, Strategy, StrategyConfig};

fn hop_count(_seed: u64, path: &[NodeId]) -> Result<f64, OracleError> {
    Ok((path.len() - 1) as f64)
}

/// Per-edge price derived from the seed, so different seeds rank paths differently.
fn seeded_edges(seed: u64, path: &[NodeId]) -> Result<f64, OracleError> {
    Ok(path
        .windows(2)
        .map(|w| ((w[0] * 31 + w[1] * 17 + seed as usize) % 9 + 1) as f64)
        .sum())
}

fn capped_config() -> StrategyConfig {
    let mut config = StrategyConfig::default();
    config.monte_carlo.max_iterations = Some(200);
    config.exploration.max_iterations = Some(200);
    config.nested = NestedConfig {
        depth: 2,
        max_iterations: Some(3),
        ..NestedConfig::default()
    };
    config.q_learning.max_episodes = Some(300);
    config
}

#[test_log::test]
fn test_time_bounded_strategies_return_nothing_at_zero_budget() {
    let graph = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (0, 2)]).unwrap();
    let oracle = FnOracle::new(hop_count);
    let problem = SearchProblem::new(&graph, 0, 3, 0, &oracle);
    for strategy in Strategy::ALL.into_iter().filter(|s| s.is_time_bounded()) {
        let outcome =
            run_strategy(&problem, strategy, Duration::ZERO, &StrategyConfig::default()).unwrap();
        assert_eq!(outcome.best_path, None, "{}", strategy.label());
        assert_eq!(outcome.best_cost, f64::INFINITY, "{}", strategy.label());
        assert_eq!(outcome.evaluations, 0, "{}", strategy.label());
    }
}

#[test_log::test]
fn test_line_graph_has_one_answer() {
    let graph = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
    let oracle = FnOracle::new(hop_count);
    let problem = SearchProblem::new(&graph, 0, 4, 3, &oracle);
    for strategy in Strategy::ALL {
        let outcome =
            run_strategy(&problem, strategy, Duration::from_secs(30), &capped_config()).unwrap();
        assert_eq!(
            outcome.best_path,
            Some(vec![0, 1, 2, 3, 4]),
            "{}",
            strategy.label()
        );
        assert_eq!(outcome.best_cost, 4.0, "{}", strategy.label());
    }
}

#[test_log::test]
fn test_star_graph_direct_hop() {
    let edges: Vec<_> = (1..=8).map(|leaf| (0, leaf)).collect();
    let graph = Graph::from_edges(9, &edges).unwrap();
    let oracle = FnOracle::new(hop_count);
    let problem = SearchProblem::new(&graph, 5, 0, 0, &oracle);
    for strategy in Strategy::ALL {
        let outcome =
            run_strategy(&problem, strategy, Duration::from_secs(30), &capped_config()).unwrap();
        assert_eq!(outcome.best_path, Some(vec![5, 0]), "{}", strategy.label());
        assert_eq!(outcome.best_cost, 1.0, "{}", strategy.label());
    }
}

#[test_log::test]
fn test_results_are_simple_paths_with_reported_cost() {
    let graph = GraphSource::Random {
        nodes: 14,
        edge_probability: 0.35,
        max_attempts: 200,
    }
    .build(42)
    .unwrap();
    let oracle = FnOracle::new(seeded_edges);
    let problem = SearchProblem::new(&graph, 0, 13, 42, &oracle);
    for strategy in Strategy::ALL {
        let outcome =
            run_strategy(&problem, strategy, Duration::from_secs(30), &capped_config()).unwrap();
        let Some(path) = outcome.best_path else {
            continue;
        };
        assert!(graph.is_simple_path(&path), "{}: {:?}", strategy.label(), path);
        assert_eq!(path.first(), Some(&0));
        assert_eq!(path.last(), Some(&13));
        assert_eq!(outcome.best_cost, seeded_edges(42, &path).unwrap());
    }
}

#[test_log::test]
fn test_same_seed_same_outcome() {
    let graph = GraphSource::Random {
        nodes: 12,
        edge_probability: 0.4,
        max_attempts: 200,
    }
    .build(9)
    .unwrap();
    let oracle = FnOracle::new(seeded_edges);
    let problem = SearchProblem::new(&graph, 0, 11, 9, &oracle);
    for strategy in [Strategy::MonteCarlo, Strategy::Exploration, Strategy::Nested, Strategy::QLearning] {
        let a = run_strategy(&problem, strategy, Duration::from_secs(30), &capped_config()).unwrap();
        let b = run_strategy(&problem, strategy, Duration::from_secs(30), &capped_config()).unwrap();
        assert_eq!(a.best_path, b.best_path, "{}", strategy.label());
        assert_eq!(a.iterations, b.iterations, "{}", strategy.label());
        assert_eq!(a.evaluations, b.evaluations, "{}", strategy.label());
    }
}

#[test_log::test]
fn test_unknown_target_is_rejected_everywhere() {
    let graph = Graph::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
    let oracle = FnOracle::new(hop_count);
    let problem = SearchProblem::new(&graph, 0, 99, 0, &oracle);
    for strategy in Strategy::ALL {
        assert!(
            run_strategy(&problem, strategy, Duration::from_secs(1), &capped_config()).is_err(),
            "{}",
            strategy.label()
        );
    }
}

#[test_log::test]
fn test_slow_oracle_overruns_budget_by_about_one_call() {
    use std::time::Instant;

    let latency = Duration::from_millis(10);
    let budget = Duration::from_millis(50);
    let slack = Duration::from_millis(40);
    let graph = GraphSource::Random {
        nodes: 30,
        edge_probability: 0.2,
        max_attempts: 200,
    }
    .build(5)
    .unwrap();
    let oracle = FnOracle::new(|_, path: &[NodeId]| {
        std::thread::sleep(latency);
        Ok((path.len() - 1) as f64)
    });
    let problem = SearchProblem::new(&graph, 0, 29, 5, &oracle);
    // Deep recursion makes one nested iteration far longer than the budget.
    let mut config = StrategyConfig::default();
    config.nested.depth = 4;
    for strategy in Strategy::ALL.into_iter().filter(|s| s.is_time_bounded()) {
        let start = Instant::now();
        let outcome = run_strategy(&problem, strategy, budget, &config).unwrap();
        let elapsed = start.elapsed();
        assert!(
            elapsed < budget + latency + slack,
            "{} ran {:?} on a {:?} budget",
            strategy.label(),
            elapsed,
            budget
        );
        assert!(outcome.evaluations > 0, "{}", strategy.label());
    }
}
