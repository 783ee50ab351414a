//! Full stack: DIMACS-shaped in-memory formulas, [StubSolver] engines,
//! [PortfolioSimple], through to a result and (on SAT) a model that
//! satisfies every input clause.

use sharesat_core::dispatch::report::Solve;
use sharesat_tests::{assert_model_satisfies, quick_config, run_to_completion, small_sat_formula, small_unsat_formula};

#[test]
fn satisfiable_formula_reports_a_satisfying_model() {
    let (clauses, var_count) = small_sat_formula();
    let (result, model) = run_to_completion(&clauses, var_count, quick_config());
    assert_eq!(result, Solve::Satisfiable);
    let model = model.expect("a satisfiable result must publish a model");
    assert_model_satisfies(&clauses, &model);
}

#[test]
fn unsatisfiable_formula_reports_unsat() {
    let (clauses, var_count) = small_unsat_formula();
    let (result, _model) = run_to_completion(&clauses, var_count, quick_config());
    assert_eq!(result, Solve::Unsatisfiable);
}

#[test]
fn a_larger_satisfiable_formula_is_solved_by_every_engine_in_a_small_portfolio() {
    // A chain of biconditionals forcing every variable to the same value;
    // satisfiable by the all-true and all-false assignments.
    let clauses: Vec<Vec<i32>> = (1..6).flat_map(|v| vec![vec![-v, v + 1], vec![v, -(v + 1)]]).collect();
    let mut config = quick_config();
    config.cpus = 3;

    let (result, model) = run_to_completion(&clauses, 6, config);
    assert_eq!(result, Solve::Satisfiable);
    assert_model_satisfies(&clauses, &model.unwrap());
}
