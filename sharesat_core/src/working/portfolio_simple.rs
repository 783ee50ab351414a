//! [PortfolioSimple]: one rank, a fixed engine mix, a single local sharer.
//!
//! Every engine shares a [ClauseBuffer](crate::buffer::ClauseBuffer)-backed
//! producer slot and a single [ClauseDatabase]; the winner is whichever
//! engine first returns a definite result.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::Sender;

use crate::buffer::ClauseBuffer;
use crate::clause::ClauseExchange;
use crate::config::Config;
use crate::db::per_size::PerSize;
use crate::db::ClauseDatabase;
use crate::dispatch::report::Solve;
use crate::dispatch::{report, Dispatch};
use crate::local::horde::HordeSat;
use crate::local::simple::Simple;
use crate::local::{LocalProducer, LocalSharingStrategy};
use crate::sharer::{Sharer, SharerTask};
use crate::sharing::SharingEntity;
use crate::solver::{SharedSolver, SolveResult, SolverInterface};

use super::termination::Termination;
use super::{diversify, WorkingStrategy};

/// Builds one fresh engine per call, given its solver id and the
/// [diversify]d parameters that id should use.
pub type SolverFactory = dyn Fn(u32, super::Diversification) -> Box<dyn SolverInterface> + Send + Sync;

/// Delivers an imported selection to every engine this run owns.
pub(crate) struct EngineSink {
    pub(crate) id: u32,
    pub(crate) solvers: Vec<SharedSolver>,
}

impl SharingEntity for EngineSink {
    fn add_client(&self, _client: Arc<dyn SharingEntity>) {}
    fn add_producer(&self, _producer: Arc<dyn SharingEntity>) {}

    fn import_clauses(&self, clauses: &[ClauseExchange]) {
        if clauses.is_empty() {
            return;
        }
        let as_vecs: Vec<Vec<i32>> = clauses.iter().map(|c| c.literals().to_vec()).collect();
        for solver in &self.solvers {
            solver.add_clauses(&as_vecs);
        }
    }

    fn entity_id(&self) -> u32 {
        self.id
    }
}

pub struct PortfolioSimple {
    config: Config,
    factory: Arc<SolverFactory>,
    dispatcher: Option<Sender<Dispatch>>,
}

impl PortfolioSimple {
    pub fn new(config: Config, factory: Arc<SolverFactory>, dispatcher: Option<Sender<Dispatch>>) -> Self {
        PortfolioSimple {
            config,
            factory,
            dispatcher,
        }
    }

    fn dispatch(&self, event: Dispatch) {
        if let Some(tx) = &self.dispatcher {
            let _ = tx.send(event);
        }
    }
}

impl WorkingStrategy for PortfolioSimple {
    fn run(&self, clauses: &[Vec<i32>], var_count: usize, termination: Arc<Termination>) -> Solve {
        let cpus = self.config.cpus.max(1);
        let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(self.config.max_clause_size));

        let mut solvers: Vec<SharedSolver> = Vec::with_capacity(cpus);
        let mut buffers: Vec<Arc<ClauseBuffer>> = Vec::with_capacity(cpus);
        for id in 0..cpus as u32 {
            // PortfolioSimple is always one rank, so diversification keys
            // only off the engine id.
            let engine: SharedSolver = Arc::from((self.factory)(id, diversify(0, id)));
            engine.load_formula(clauses, var_count);

            let buffer = Arc::new(ClauseBuffer::new(self.config.max_clause_size));
            let export_buffer = Arc::clone(&buffer);
            engine.set_export_callback(Box::new(move |literals, lbd| {
                if !literals.is_empty() {
                    export_buffer.add_clause(ClauseExchange::new(literals, lbd, id));
                }
            }));
            buffers.push(buffer);
            solvers.push(engine);
        }

        let producers: Vec<LocalProducer> = buffers
            .iter()
            .enumerate()
            .map(|(i, buffer)| {
                let solver = Arc::clone(&solvers[i]);
                LocalProducer::new(
                    i as u32,
                    Arc::clone(buffer),
                    Box::new(move |limit| solver.set_lbd_limit(limit)),
                )
            })
            .collect();

        let sink = Arc::new(EngineSink {
            id: u32::MAX,
            solvers: solvers.clone(),
        });

        let lbd_envelope = self.config.lbd_limit_envelope();
        let local_task: Arc<dyn LocalSharingStrategy> = match self.config.local_strategy_kind() {
            crate::config::LocalStrategyKind::HordeSat => Arc::new(HordeSat::new(
                producers,
                Arc::clone(&database),
                self.config.shared_literals_per_producer,
                self.config.horde_init_round,
                self.config.horde_initial_lbd_limit,
                lbd_envelope,
                Duration::from_millis(50),
                self.dispatcher.clone(),
            )),
            crate::config::LocalStrategyKind::Simple => Arc::new(Simple::new(
                producers,
                Arc::clone(&database),
                self.config.simple_share_limit,
                Duration::from_millis(50),
                self.dispatcher.clone(),
            )),
        };
        local_task.add_consumer(sink);

        let sharer = Sharer::spawn(vec![SharerTask::Local(local_task)], self.config.one_sharer);

        let handles: Vec<_> = solvers
            .iter()
            .enumerate()
            .map(|(id, solver)| {
                let solver = Arc::clone(solver);
                let termination = Arc::clone(&termination);
                thread::spawn(move || {
                    let result = solver.solve(&[]);
                    if !matches!(result, SolveResult::Unknown) {
                        let model = solver.get_model();
                        termination.publish(Solve::from(result), model, 0);
                    }
                    id
                })
            })
            .collect();

        let deadline = self.config.timeout.map(Duration::from_secs);
        let outcome = termination.wait(deadline);

        // Interrupt whatever engines are still running, whether we timed out
        // or a sibling engine already published.
        for solver in &solvers {
            solver.set_interrupt();
        }
        for handle in handles {
            let _ = handle.join();
        }

        sharer.join();

        let (result, _model, winner_rank) = match outcome {
            Some((result, model, winner_rank)) => (result, model, winner_rank),
            None => {
                termination.publish(Solve::TimedOut, None, 0);
                (Solve::TimedOut, None, 0)
            }
        };

        self.dispatch(Dispatch::Report(report::Report::Terminated { result, winner_rank }));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{ExportCallback, SolverType};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Returns `Satisfiable` immediately, never exports a clause. Enough to
    /// exercise the run/termination/join plumbing deterministically.
    struct ImmediateSat {
        id: u32,
        interrupted: AtomicBool,
    }

    impl SolverInterface for ImmediateSat {
        fn load_formula(&self, _clauses: &[Vec<i32>], _var_count: usize) {}

        fn solve(&self, _cube: &[i32]) -> SolveResult {
            SolveResult::Satisfiable
        }

        fn add_clause(&self, _clause: &[i32]) {}

        fn set_export_callback(&self, _callback: ExportCallback) {}

        fn set_lbd_limit(&self, _limit: f64) {}

        fn set_interrupt(&self) {
            self.interrupted.store(true, Ordering::SeqCst);
        }

        fn unset_interrupt(&self) {
            self.interrupted.store(false, Ordering::SeqCst);
        }

        fn get_model(&self) -> Option<Vec<i32>> {
            Some(vec![1, -2])
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

    #[test]
    fn run_terminates_with_the_first_engines_result() {
        let mut config = Config::default();
        config.cpus = 2;
        config.simple = true;

        let factory: Arc<SolverFactory> =
            Arc::new(|id, _div| Box::new(ImmediateSat { id, interrupted: AtomicBool::new(false) }));
        let portfolio = PortfolioSimple::new(config, factory, None);
        let termination = Termination::new();

        let result = portfolio.run(&[], 0, Arc::clone(&termination));
        assert_eq!(result, Solve::Satisfiable);
        assert!(termination.should_stop());
    }
}
