//! [Mallob] global strategy: tree-reduce with bandwidth compensation.
//!
//! Ranks are arranged as a binary tree over rank index (`parent(r) =
//! (r-1)/2`). Each interior rank waits for its children's contributions,
//! merges them with its own local selection into a buffer bounded by
//! `mallob_max_buffer_size`, and forwards the merge to its parent. Once the
//! merge reaches rank 0 it is broadcast back down to every rank.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam::channel::Sender;

use crate::db::ClauseDatabase;
use crate::dispatch::{stat, Dispatch};
use crate::error;
use crate::global::{GlobalSharingStrategy, Transport};
use crate::misc::log::targets;
use crate::sharing::SharingEntity;
use crate::wire;

fn parent(rank: u32) -> Option<u32> {
    if rank == 0 {
        None
    } else {
        Some((rank - 1) / 2)
    }
}

fn children(rank: u32, world_size: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(2);
    let left = 2 * rank + 1;
    let right = 2 * rank + 2;
    if left < world_size {
        out.push(left);
    }
    if right < world_size {
        out.push(right);
    }
    out
}

/// Paces how many literals a rank may push upward per reshare window,
/// allowing a rank that was quiet last window to "compensate" by sending more
/// this window, bounded by `max_compensation`.
struct CompensationTracker {
    base_budget: usize,
    max_compensation: f64,
    window: Duration,
    window_start: Mutex<Instant>,
    spent_this_window: AtomicU64,
    carried_over: AtomicU64,
}

impl CompensationTracker {
    fn new(base_budget: usize, max_compensation: f64, window: Duration) -> Self {
        CompensationTracker {
            base_budget,
            max_compensation: max_compensation.max(1.0),
            window,
            window_start: Mutex::new(Instant::now()),
            spent_this_window: AtomicU64::new(0),
            carried_over: AtomicU64::new(0),
        }
    }

    /// Rolls the window forward if `window` has elapsed, carrying any unused
    /// budget into `carried_over` (bounded so compensation cannot grow
    /// unboundedly across long idle stretches).
    fn roll_window(&self) {
        let mut start = self.window_start.lock().unwrap();
        if start.elapsed() >= self.window {
            let spent = self.spent_this_window.swap(0, Ordering::SeqCst);
            let unused = (self.base_budget as u64).saturating_sub(spent);
            let cap = (self.base_budget as f64 * self.max_compensation) as u64;
            let carried = self.carried_over.load(Ordering::SeqCst);
            let next = (carried + unused).min(cap);
            self.carried_over.store(next, Ordering::SeqCst);
            log::trace!(target: targets::GLOBAL, "Mallob: compensation window rolled, {unused} literals unused, {next} carried forward");
            *start = Instant::now();
        }
    }

    fn available_literals(&self) -> usize {
        self.roll_window();
        let carried = self.carried_over.load(Ordering::SeqCst) as usize;
        self.base_budget.saturating_add(carried)
    }

    fn record_spent(&self, literals: usize) {
        self.spent_this_window.fetch_add(literals as u64, Ordering::SeqCst);
        let carried = self.carried_over.load(Ordering::SeqCst);
        let drawdown = (literals as u64).min(carried);
        if drawdown > 0 {
            self.carried_over.fetch_sub(drawdown, Ordering::SeqCst);
        }
    }
}

pub struct Mallob {
    transport: Arc<dyn Transport>,
    database: Arc<dyn ClauseDatabase>,
    consumers: Mutex<Vec<Arc<dyn SharingEntity>>>,
    lbd_limit: u32,
    size_limit: usize,
    buffer_clauses: usize,
    compensation: CompensationTracker,
    period: Duration,
    dispatcher: Option<Sender<Dispatch>>,
}

impl Mallob {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transport: Arc<dyn Transport>,
        database: Arc<dyn ClauseDatabase>,
        lbd_limit: u32,
        size_limit: usize,
        buffer_clauses: usize,
        max_compensation: f64,
        reshare_period: Duration,
        period: Duration,
        dispatcher: Option<Sender<Dispatch>>,
    ) -> Self {
        // A literal budget proportional to the clause buffer: assume an
        // average admitted clause is roughly `size_limit / 2` literals so the
        // buffer's clause-count intent survives translation into the
        // literal-budget vocabulary the rest of the fabric speaks.
        let base_literal_budget = buffer_clauses.saturating_mul(size_limit.max(1)) / 2;
        Mallob {
            transport,
            database,
            consumers: Mutex::new(Vec::new()),
            lbd_limit,
            size_limit,
            buffer_clauses,
            compensation: CompensationTracker::new(base_literal_budget.max(1), max_compensation, reshare_period),
            period,
            dispatcher,
        }
    }

    pub fn add_consumer(&self, consumer: Arc<dyn SharingEntity>) {
        self.consumers.lock().unwrap().push(consumer);
    }

    fn local_contribution(&self) -> Vec<u8> {
        let budget = self.compensation.available_literals();
        // The local database may be any `ClauseDatabase` impl (not
        // necessarily `db::mallob::Mallob`); apply this strategy's own
        // ingress filters here rather than assuming a richer selection API.
        let selection: Vec<_> = self
            .database
            .give_selection(budget)
            .into_iter()
            .filter(|c| c.size() <= self.size_limit && c.lbd() <= self.lbd_limit)
            .collect();
        let literals: usize = selection.iter().map(|c| c.size()).sum();
        self.compensation.record_spent(literals);
        wire::encode_bounded(&selection, budget)
    }

    fn merge_children(&self, rank: u32) -> Result<Vec<u8>, error::Transport> {
        let own = self.local_contribution();
        let mut merged = wire::decode_payload(&own, rank).unwrap_or_default();
        for child in children(rank, self.transport.world_size()) {
            let from_child = self.transport.recv(child)?;
            if let Ok(clauses) = wire::decode_payload(&from_child, child) {
                merged.extend(clauses);
            }
        }
        // Re-bound so a merge of several children's contributions still
        // respects the buffer's clause-count intent rather than growing
        // without limit toward the root.
        merged.truncate(self.buffer_clauses);
        Ok(wire::encode_payload(&merged))
    }

    fn exchange(&self) -> Result<(), error::Transport> {
        let rank = self.transport.rank();
        let merged = self.merge_children(rank)?;
        let bytes_sent = merged.len();
        log::trace!(target: targets::GLOBAL, "Mallob: rank {rank} merged {bytes_sent} bytes from its subtree");

        let result = if let Some(p) = parent(rank) {
            self.transport.send(p, merged)?;
            self.transport.broadcast(0, None)?
        } else {
            self.transport.broadcast(0, Some(merged))?
        };

        let bytes_received = result.len();
        if let Ok(clauses) = wire::decode_payload(&result, 0) {
            log::trace!(target: targets::GLOBAL, "Mallob: rank {rank} received {} clauses from the root broadcast", clauses.len());
            let consumers = self.consumers.lock().unwrap();
            for consumer in consumers.iter() {
                consumer.import_clauses(&clauses);
            }
        }

        if let Some(tx) = &self.dispatcher {
            let _ = tx.send(Dispatch::Stat(stat::Stat::GlobalExchange {
                rank,
                bytes_sent,
                bytes_received,
            }));
        }
        Ok(())
    }
}

impl GlobalSharingStrategy for Mallob {
    fn init_transport(&self) -> bool {
        self.transport.init().is_ok()
    }

    fn do_sharing(&self) {
        let _ = self.exchange();
    }

    fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::ClauseExchange;
    use crate::db::per_size::PerSize;
    use crate::global::transport::ChannelTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn tree_topology_matches_binary_heap_indexing() {
        assert_eq!(parent(0), None);
        assert_eq!(parent(1), Some(0));
        assert_eq!(parent(2), Some(0));
        assert_eq!(parent(3), Some(1));
        assert_eq!(parent(4), Some(1));
        assert_eq!(children(0, 5), vec![1, 2]);
        assert_eq!(children(1, 5), vec![3, 4]);
        assert_eq!(children(2, 5), Vec::<u32>::new());
    }

    struct Sink(AtomicUsize);
    impl SharingEntity for Sink {
        fn add_client(&self, _c: Arc<dyn SharingEntity>) {}
        fn add_producer(&self, _p: Arc<dyn SharingEntity>) {}
        fn import_clauses(&self, clauses: &[ClauseExchange]) {
            self.0.fetch_add(clauses.len(), Ordering::SeqCst);
        }
        fn entity_id(&self) -> u32 {
            0
        }
    }

    #[test]
    fn every_rank_receives_the_root_broadcast_merge() {
        let world = 5;
        let cluster = ChannelTransport::cluster(world);
        let sinks: Vec<Arc<Sink>> = (0..world).map(|_| Arc::new(Sink(AtomicUsize::new(0)))).collect();

        let handles: Vec<_> = cluster
            .into_iter()
            .zip(sinks.iter().cloned())
            .map(|(transport, sink)| {
                thread::spawn(move || {
                    let rank = transport.rank();
                    let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(16));
                    database.add_clause(ClauseExchange::new(vec![rank as i32 + 1, rank as i32 + 2], 1, rank));

                    let strategy = Mallob::new(
                        transport,
                        database,
                        8,
                        8,
                        32,
                        2.0,
                        Duration::from_millis(50),
                        Duration::from_millis(1),
                        None,
                    );
                    strategy.add_consumer(sink);
                    assert!(strategy.init_transport());
                    strategy.do_sharing();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for sink in &sinks {
            // every rank's own clause plus at least some of the others
            // should have made it into the merge that gets broadcast back.
            assert!(sink.0.load(Ordering::SeqCst) >= 1);
        }
    }

    #[test]
    fn compensation_tracker_grants_carryover_after_quiet_window() {
        let tracker = CompensationTracker::new(10, 2.0, Duration::from_millis(1));
        assert_eq!(tracker.available_literals(), 10);
        tracker.record_spent(0);
        std::thread::sleep(Duration::from_millis(2));
        // the idle window should have carried its unused budget forward.
        assert!(tracker.available_literals() > 10);
    }
}
