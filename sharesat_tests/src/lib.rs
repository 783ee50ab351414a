//! Shared harness helpers for the integration tests: running a full
//! portfolio end to end over a small in-memory formula, and checking the
//! properties §8 cares about (model satisfies every input clause, and so
//! on) without every test re-deriving the plumbing.

use std::sync::Arc;

use sharesat_cli::solver::StubSolver;
use sharesat_core::config::Config;
use sharesat_core::dispatch::report::Solve;
use sharesat_core::solver::SolverInterface;
use sharesat_core::working::portfolio_simple::{PortfolioSimple, SolverFactory};
use sharesat_core::working::termination::Termination;
use sharesat_core::working::WorkingStrategy;

/// Runs `clauses` to completion on [PortfolioSimple] with [StubSolver]
/// engines, under `config`. Returns the outcome and, on `Satisfiable`, the
/// winning model.
pub fn run_to_completion(
    clauses: &[Vec<i32>],
    var_count: usize,
    config: Config,
) -> (Solve, Option<Vec<i32>>) {
    let factory: Arc<SolverFactory> = Arc::new(|id, diversification| -> Box<dyn SolverInterface> {
        Box::new(StubSolver::new(id, diversification))
    });
    let portfolio = PortfolioSimple::new(config, factory, None);
    let termination = Termination::new();
    let result = portfolio.run(clauses, var_count, Arc::clone(&termination));
    let model = termination.result().and_then(|(_, model, _)| model);
    (result, model)
}

/// A config with one engine and a short timeout, suitable for
/// small-formula tests that must not hang if `StubSolver` regresses.
pub fn quick_config() -> Config {
    let mut config = Config::default();
    config.cpus = 1;
    config.timeout = Some(5);
    config
}

/// Asserts `model` satisfies every clause in `clauses`: for each clause,
/// some literal of it appears (with the same sign) in `model`.
pub fn assert_model_satisfies(clauses: &[Vec<i32>], model: &[i32]) {
    for clause in clauses {
        assert!(
            clause.iter().any(|literal| model.contains(literal)),
            "clause {clause:?} not satisfied by model {model:?}"
        );
    }
}

/// A small satisfiable formula: `(x1 | x2) & (-x1 | x2) & (x1 | -x2)`.
/// Unique model: `x1 = true, x2 = true`.
pub fn small_sat_formula() -> (Vec<Vec<i32>>, usize) {
    (vec![vec![1, 2], vec![-1, 2], vec![1, -2]], 2)
}

/// A small unsatisfiable formula: every assignment of `x1` conflicts with
/// one of the two unit clauses.
pub fn small_unsat_formula() -> (Vec<Vec<i32>>, usize) {
    (vec![vec![1], vec![-1]], 1)
}
