//! [StubSolver]: a reference [SolverInterface] good enough to exercise the
//! fabric end to end. Plain DPLL with unit propagation and a simplified
//! 1-UIP-style conflict learner — not a competitive CDCL engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sharesat_core::solver::{ExportCallback, SolveResult, SolverInterface, SolverType};
use sharesat_core::working::Diversification;

/// One decision or propagation step on the trail.
#[derive(Clone, Copy)]
struct Step {
    literal: i32,
    /// `true` for a branching decision, `false` for a propagated consequence.
    decision: bool,
}

struct Search {
    /// `assignment[v]`: 0 unassigned, 1 true, -1 false, indexed by variable.
    assignment: Vec<i8>,
    trail: Vec<Step>,
    clauses: Vec<Vec<i32>>,
    /// Decision order, shuffled once per engine by its diversification seed.
    decision_order: Vec<i32>,
    conflicts_since_restart: u32,
}

impl Search {
    fn new(var_count: usize, seed: u64) -> Self {
        let mut order: Vec<i32> = (1..=var_count as i32).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        for i in (1..order.len()).rev() {
            let j = rng.gen_range(0..=i);
            order.swap(i, j);
        }
        Search {
            assignment: vec![0; var_count + 1],
            trail: Vec::new(),
            clauses: Vec::new(),
            decision_order: order,
            conflicts_since_restart: 0,
        }
    }

    fn value(&self, literal: i32) -> i8 {
        let v = self.assignment[literal.unsigned_abs() as usize];
        if literal < 0 {
            -v
        } else {
            v
        }
    }

    fn assign(&mut self, literal: i32, decision: bool) {
        self.assignment[literal.unsigned_abs() as usize] = if literal > 0 { 1 } else { -1 };
        self.trail.push(Step { literal, decision });
    }

    /// Propagates units to a fixpoint. Returns the first falsified clause, if any.
    fn propagate(&mut self) -> Option<Vec<i32>> {
        loop {
            let mut progressed = false;
            for clause in self.clauses.clone() {
                let mut unassigned = None;
                let mut satisfied = false;
                let mut unassigned_count = 0;
                for &literal in &clause {
                    match self.value(literal) {
                        1 => {
                            satisfied = true;
                            break;
                        }
                        0 => {
                            unassigned_count += 1;
                            unassigned = Some(literal);
                        }
                        _ => {}
                    }
                }
                if satisfied {
                    continue;
                }
                if unassigned_count == 0 {
                    return Some(clause);
                }
                if unassigned_count == 1 {
                    self.assign(unassigned.unwrap(), false);
                    progressed = true;
                }
            }
            if !progressed {
                return None;
            }
        }
    }

    /// Undoes every assignment on the trail, keeping all learned clauses.
    /// Rotates the decision order so a restart actually explores a
    /// different branch rather than immediately re-deriving the same
    /// conflict.
    fn restart(&mut self) {
        for step in self.trail.drain(..) {
            self.assignment[step.literal.unsigned_abs() as usize] = 0;
        }
        self.conflicts_since_restart = 0;
        if !self.decision_order.is_empty() {
            self.decision_order.rotate_left(1);
        }
    }

    fn pick_decision(&self, bias: bool) -> Option<i32> {
        for &var in &self.decision_order {
            if self.assignment[var as usize] == 0 {
                return Some(if bias { var } else { -var });
            }
        }
        None
    }

    /// Backtracks to (and flips) the most recent undecided decision literal.
    /// Returns the learned clause (negation of every decision still on the
    /// trail at the point of conflict) alongside whether backtracking was
    /// possible at all.
    fn backtrack_and_learn(&mut self) -> Option<Vec<i32>> {
        let learned: Vec<i32> = self
            .trail
            .iter()
            .filter(|s| s.decision)
            .map(|s| -s.literal)
            .collect();

        while let Some(step) = self.trail.pop() {
            self.assignment[step.literal.unsigned_abs() as usize] = 0;
            if step.decision {
                self.assign(-step.literal, false);
                return if learned.is_empty() { None } else { Some(learned) };
            }
        }
        None
    }
}

struct State {
    search: Option<Search>,
    var_count: usize,
    lbd_limit: f64,
    export_callback: Option<ExportCallback>,
    model: Option<Vec<i32>>,
    pending_imports: Vec<Vec<i32>>,
}

/// Plain DPLL reference engine. Decision order and initial polarity are
/// diversified per instance; clause import is lock-free with respect to a
/// running [solve](SolverInterface::solve) up to the bound of one internal
/// lock (held only while touching shared search state, never across a whole
/// propagation loop).
pub struct StubSolver {
    id: u32,
    diversification: Diversification,
    interrupted: AtomicBool,
    state: Mutex<State>,
}

impl StubSolver {
    pub fn new(id: u32, diversification: Diversification) -> Self {
        StubSolver {
            id,
            diversification,
            interrupted: AtomicBool::new(false),
            state: Mutex::new(State {
                search: None,
                var_count: 0,
                lbd_limit: f64::INFINITY,
                export_callback: None,
                model: None,
                pending_imports: Vec::new(),
            }),
        }
    }
}

impl SolverInterface for StubSolver {
    fn load_formula(&self, clauses: &[Vec<i32>], var_count: usize) {
        let mut state = self.state.lock().unwrap();
        state.var_count = var_count;
        let mut search = Search::new(var_count, self.diversification.seed);
        search.clauses = clauses.to_vec();
        state.search = Some(search);
    }

    fn solve(&self, cube: &[i32]) -> SolveResult {
        self.interrupted.store(false, Ordering::SeqCst);

        {
            let mut state = self.state.lock().unwrap();
            for &literal in cube {
                if let Some(search) = state.search.as_mut() {
                    if search.value(literal) == 0 {
                        search.assign(literal, true);
                    }
                }
            }
        }

        let bias = self.diversification.polarity_bias;
        let restart_interval = self.diversification.restart_interval;

        loop {
            if self.interrupted.load(Ordering::SeqCst) {
                return SolveResult::Unknown;
            }

            let mut state = self.state.lock().unwrap();

            let imports: Vec<Vec<i32>> = std::mem::take(&mut state.pending_imports);
            if let Some(search) = state.search.as_mut() {
                search.clauses.extend(imports);
            }

            let outcome = {
                let lbd_limit = state.lbd_limit;
                let callback_present = state.export_callback.is_some();
                let Some(search) = state.search.as_mut() else {
                    return SolveResult::Unknown;
                };

                match search.propagate() {
                    None => {
                        if search.pick_decision(bias).is_none() {
                            let model: Vec<i32> = (1..=search.assignment.len() as i32 - 1)
                                .map(|v| if search.value(v) >= 0 { v } else { -v })
                                .collect();
                            Decision::Satisfied(model)
                        } else {
                            let literal = search.pick_decision(bias).unwrap();
                            search.assign(literal, true);
                            Decision::Continue
                        }
                    }
                    Some(_conflict) => {
                        search.conflicts_since_restart += 1;
                        match search.backtrack_and_learn() {
                            Some(learned) => {
                                let lbd = learned.len().min(u32::MAX as usize) as u32;
                                if callback_present && (lbd as f64) <= lbd_limit {
                                    search.clauses.push(learned.clone());
                                    Decision::Learned(learned, lbd)
                                } else {
                                    search.clauses.push(learned);
                                    Decision::Continue
                                }
                            }
                            None => Decision::Unsatisfiable,
                        }
                    }
                }
            };

            match outcome {
                Decision::Satisfied(model) => {
                    state.model = Some(model);
                    return SolveResult::Satisfiable;
                }
                Decision::Unsatisfiable => {
                    return SolveResult::Unsatisfiable;
                }
                Decision::Learned(literals, lbd) => {
                    let callback = state.export_callback.as_ref();
                    if let Some(callback) = callback {
                        callback(literals, lbd);
                    }
                }
                Decision::Continue => {}
            }

            if let Some(search) = state.search.as_mut() {
                if restart_interval > 0 && search.conflicts_since_restart >= restart_interval {
                    search.restart();
                }
            }
        }
    }

    fn add_clause(&self, clause: &[i32]) {
        if clause.is_empty() {
            return;
        }
        let mut state = self.state.lock().unwrap();
        state.pending_imports.push(clause.to_vec());
    }

    fn set_export_callback(&self, callback: ExportCallback) {
        self.state.lock().unwrap().export_callback = Some(callback);
    }

    fn set_lbd_limit(&self, limit: f64) {
        self.state.lock().unwrap().lbd_limit = limit;
    }

    fn set_interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    fn unset_interrupt(&self) {
        self.interrupted.store(false, Ordering::SeqCst);
    }

    fn get_model(&self) -> Option<Vec<i32>> {
        self.state.lock().unwrap().model.clone()
    }

    fn get_solver_id(&self) -> u32 {
        self.id
    }

    fn get_solver_type_id(&self) -> u32 {
        0
    }

    fn get_solver_type(&self) -> SolverType {
        SolverType::Cdcl
    }
}

enum Decision {
    Continue,
    Satisfied(Vec<i32>),
    Unsatisfiable,
    Learned(Vec<i32>, u32),
}
