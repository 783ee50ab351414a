//! [PortfolioPrs]: preprocessing-aware, group-partitioned, distributed
//! portfolio. Every rank is assigned into one of the `{SAT, UNSAT, MAPLE,
//! LGL, DEFAULT}` groups of [rank_group] — all of that rank's local engines
//! share the assignment — and, if a [Transport] is available, a
//! [GlobalSharingStrategy] rides alongside each rank's local sharer, scoped
//! to the rank's own group.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam::channel::Sender;

use crate::buffer::ClauseBuffer;
use crate::clause::ClauseExchange;
use crate::config::{Config, GlobalStrategyKind};
use crate::db::per_size::PerSize;
use crate::db::ClauseDatabase;
use crate::dispatch::report::Solve;
use crate::dispatch::{report, Dispatch};
use crate::global::all_gather::AllGather;
use crate::global::mallob::Mallob as GlobalMallob;
use crate::global::ring::Ring;
use crate::global::{GlobalSharingStrategy, Transport};
use crate::local::horde::HordeSat;
use crate::local::simple::Simple;
use crate::local::{LocalProducer, LocalSharingStrategy};
use crate::sharer::{Sharer, SharerTask};
use crate::sharing::SharingEntity;
use crate::solver::{SharedSolver, SolveResult, SolverInterface};

use super::portfolio_simple::EngineSink;
use super::termination::Termination;
use super::{diversify, rank_group, Diversification, EngineGroup, PrsPhase, WorkingStrategy};

/// Builds one fresh engine per call, given its solver id, assigned group, and
/// [diversify]d parameters.
pub type GroupedSolverFactory =
    dyn Fn(u32, EngineGroup, Diversification) -> Box<dyn SolverInterface> + Send + Sync;

pub struct PortfolioPrs {
    config: Config,
    factory: Arc<GroupedSolverFactory>,
    transport: Arc<dyn Transport>,
    dispatcher: Option<Sender<Dispatch>>,
    phase: Mutex<PrsPhase>,
}

impl PortfolioPrs {
    pub fn new(
        config: Config,
        factory: Arc<GroupedSolverFactory>,
        transport: Arc<dyn Transport>,
        dispatcher: Option<Sender<Dispatch>>,
    ) -> Self {
        PortfolioPrs {
            config,
            factory,
            transport,
            dispatcher,
            phase: Mutex::new(PrsPhase::Preprocessing),
        }
    }

    pub fn phase(&self) -> PrsPhase {
        *self.phase.lock().unwrap()
    }

    fn set_phase(&self, phase: PrsPhase) {
        *self.phase.lock().unwrap() = phase;
    }

    fn dispatch(&self, event: Dispatch) {
        if let Some(tx) = &self.dispatcher {
            let _ = tx.send(event);
        }
    }

    /// Builds this run's global strategy (if distributed) over `database`,
    /// with `consumer` already attached — attaching has to happen while the
    /// concrete type (`AllGather`/`Ring`/`Mallob`) is still known, since
    /// `add_consumer` is an inherent method on each, not part of
    /// [GlobalSharingStrategy] itself.
    ///
    /// `group_base`/`group_size` bound the rank range of this rank's PRS
    /// group (see [rank_group]); a [Ring] confines its neighbour topology to
    /// that range rather than the whole transport world.
    fn build_global_strategy(
        &self,
        database: Arc<dyn ClauseDatabase>,
        consumer: Arc<dyn SharingEntity>,
        group_base: u32,
        group_size: u32,
    ) -> Arc<dyn GlobalSharingStrategy> {
        let period = Duration::from_secs_f64(self.config.mallob_reshare_period.max(0.05));
        match self.config.global_strategy {
            GlobalStrategyKind::AllGather => {
                let strategy = AllGather::new(
                    Arc::clone(&self.transport),
                    database,
                    self.config.global_shared_literals,
                    period,
                    self.dispatcher.clone(),
                );
                strategy.add_consumer(consumer);
                Arc::new(strategy)
            }
            GlobalStrategyKind::Ring => {
                let strategy = Ring::new_in_group(
                    Arc::clone(&self.transport),
                    database,
                    self.config.global_shared_literals,
                    self.config.mallob_max_buffer_size,
                    period,
                    self.dispatcher.clone(),
                    group_base,
                    group_size,
                );
                strategy.add_consumer(consumer);
                Arc::new(strategy)
            }
            GlobalStrategyKind::Mallob => {
                let strategy = GlobalMallob::new(
                    Arc::clone(&self.transport),
                    database,
                    self.config.mallob_lbd_limit,
                    self.config.mallob_size_limit,
                    self.config.mallob_max_buffer_size,
                    self.config.mallob_max_compensation,
                    Duration::from_secs_f64(self.config.mallob_reshare_period.max(0.05)),
                    period,
                    self.dispatcher.clone(),
                );
                strategy.add_consumer(consumer);
                Arc::new(strategy)
            }
        }
    }
}

impl WorkingStrategy for PortfolioPrs {
    fn run(&self, clauses: &[Vec<i32>], var_count: usize, termination: Arc<Termination>) -> Solve {
        self.set_phase(PrsPhase::Preprocessing);
        let cpus = self.config.cpus.max(1);
        let rank = self.transport.rank();
        let world_size = self.transport.world_size().max(1) as usize;
        // PRS partitions ranks into groups, not a rank's local engine count:
        // every engine this rank spawns shares the one group its rank falls
        // into (spec §4; `PortfolioPRS.cpp::computeNodeGroup`).
        let (my_group, group_base, group_size) = rank_group(world_size, rank);
        let groups: Vec<EngineGroup> = std::iter::repeat(my_group).take(cpus).collect();
        let local_database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(self.config.max_clause_size));

        self.set_phase(PrsPhase::Broadcasting);
        // Every rank was already handed the same formula by the caller
        // (spec.md places DIMACS/PRS preprocessing out of scope); this phase
        // is a synchronization point, not a data transfer, under a
        // `LoopbackTransport` or a real distributed one alike.
        let distributed = self.config.enable_distributed && self.transport.init().is_ok();
        if distributed {
            let _ = self.transport.broadcast(0, if self.transport.rank() == 0 { Some(Vec::new()) } else { None });
        }

        self.set_phase(PrsPhase::Running);

        let mut solvers: Vec<SharedSolver> = Vec::with_capacity(cpus);
        let mut buffers: Vec<Arc<ClauseBuffer>> = Vec::with_capacity(cpus);
        for (id, group) in groups.iter().enumerate() {
            let id = id as u32;
            let engine: SharedSolver = Arc::from((self.factory)(id, *group, diversify(rank, id)));
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

        let local_sink = Arc::new(EngineSink {
            id: u32::MAX,
            solvers: solvers.clone(),
        });

        let lbd_envelope = self.config.lbd_limit_envelope();
        let local_task: Arc<dyn LocalSharingStrategy> = match self.config.local_strategy_kind() {
            crate::config::LocalStrategyKind::HordeSat => Arc::new(HordeSat::new(
                producers,
                Arc::clone(&local_database),
                self.config.shared_literals_per_producer,
                self.config.horde_init_round,
                self.config.horde_initial_lbd_limit,
                lbd_envelope,
                Duration::from_millis(50),
                self.dispatcher.clone(),
            )),
            crate::config::LocalStrategyKind::Simple => Arc::new(Simple::new(
                producers,
                Arc::clone(&local_database),
                self.config.simple_share_limit,
                Duration::from_millis(50),
                self.dispatcher.clone(),
            )),
        };
        local_task.add_consumer(local_sink);

        let mut tasks = vec![SharerTask::Local(local_task)];

        if distributed {
            // The global strategy draws from the same database the local
            // strategy's selections are admitted to, so cross-rank export
            // competes fairly with local export for the same bounded,
            // deduplicated pool.
            let global_sink = Arc::new(EngineSink {
                id: u32::MAX - 1,
                solvers: solvers.clone(),
            });
            let global_strategy =
                self.build_global_strategy(Arc::clone(&local_database), global_sink, group_base, group_size);
            if global_strategy.init_transport() {
                tasks.push(SharerTask::Global(global_strategy));
            }
        }

        let sharer = Sharer::spawn(tasks, self.config.one_sharer);

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

        for solver in &solvers {
            solver.set_interrupt();
        }
        for handle in handles {
            let _ = handle.join();
        }
        sharer.join();

        self.set_phase(PrsPhase::Done);

        let (result, _model, winner_rank) = match outcome {
            Some((result, model, winner_rank)) => (result, model, winner_rank),
            None => {
                termination.publish(Solve::TimedOut, None, self.transport.rank());
                (Solve::TimedOut, None, self.transport.rank())
            }
        };

        self.dispatch(Dispatch::Report(report::Report::Terminated { result, winner_rank }));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global::transport::LoopbackTransport;
    use crate::solver::{ExportCallback, SolverType};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn every_engine_on_a_rank_shares_that_ranks_single_group() {
        // world_size 16, rank 0 falls in the SAT group (ranks 0-1); every
        // engine this rank spawns must carry that one group, not a split
        // across several groups by local engine id.
        let world_size = 16;
        let (expected_group, _base, _size) = rank_group(world_size, 0);
        assert_eq!(expected_group, EngineGroup::Sat);
        let cpus = 4;
        let groups: Vec<EngineGroup> = std::iter::repeat(expected_group).take(cpus).collect();
        assert!(groups.iter().all(|g| *g == EngineGroup::Sat));
    }

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
            Some(vec![1])
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
    fn non_distributed_run_terminates_without_a_transport_round_trip() {
        let mut config = Config::default();
        config.cpus = 3;
        config.enable_distributed = false;

        let factory: Arc<GroupedSolverFactory> =
            Arc::new(|id, _group, _div| Box::new(ImmediateSat { id, interrupted: AtomicBool::new(false) }));
        let transport = Arc::new(LoopbackTransport::default());
        let prs = PortfolioPrs::new(config, factory, transport, None);

        let termination = Termination::new();
        let result = prs.run(&[], 0, termination);
        assert_eq!(result, Solve::Satisfiable);
        assert_eq!(prs.phase(), PrsPhase::Done);
    }
}
