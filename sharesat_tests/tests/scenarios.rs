//! The six numbered scenarios from the testable-properties section, run as
//! black-box integration tests against `sharesat_core`'s public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sharesat_core::buffer::ClauseBuffer;
use sharesat_core::clause::ClauseExchange;
use sharesat_core::db::buffer_per_entity::BufferPerEntity;
use sharesat_core::db::per_size::PerSize;
use sharesat_core::db::ClauseDatabase;
use sharesat_core::global::ring::Ring;
use sharesat_core::global::transport::ChannelTransport;
use sharesat_core::global::{GlobalSharingStrategy, Transport};
use sharesat_core::local::horde::HordeSat;
use sharesat_core::local::{LocalProducer, LocalSharingStrategy};
use sharesat_core::sharing::SharingEntity;
use sharesat_core::working::termination::Termination;

/// 1. Selection budget: eight size-3 clauses (24 literals); `give_selection(10)`
/// returns exactly 3 clauses (9 literals); 5 remain.
#[test]
fn selection_budget() {
    let db = PerSize::new(16);
    for i in 0..8 {
        db.add_clause(ClauseExchange::new(vec![i * 3 + 1, i * 3 + 2, i * 3 + 3], 2, 0));
    }
    let selection = db.give_selection(10);
    assert_eq!(selection.len(), 3);
    assert_eq!(selection.iter().map(|c| c.size()).sum::<usize>(), 9);
    assert_eq!(db.len(), 5);
}

/// 2. Per-size ordering: sizes {5,2,3,2}; `give_selection(inf)` yields
/// ascending sizes `[2,2,3,5]`.
#[test]
fn per_size_ordering() {
    let db = PerSize::new(8);
    db.add_clause(ClauseExchange::new(vec![1, 2, 3, 4, 5], 1, 0));
    db.add_clause(ClauseExchange::new(vec![6, 7], 1, 0));
    db.add_clause(ClauseExchange::new(vec![8, 9, 10], 1, 0));
    db.add_clause(ClauseExchange::new(vec![11, 12], 1, 0));
    let selection = db.give_selection(usize::MAX);
    let sizes: Vec<usize> = selection.iter().map(|c| c.size()).collect();
    assert_eq!(sizes, vec![2, 2, 3, 5]);
}

/// 3. Concurrent shard creation: 8 threads each `add_clause` with a distinct
/// `from` into a fresh `BufferPerEntity`; after join, `size() == 8` and 8
/// distinct shards exist.
#[test]
fn concurrent_shard_creation() {
    let db = Arc::new(BufferPerEntity::new(8));
    let handles: Vec<_> = (0..8u32)
        .map(|from| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                db.add_clause(ClauseExchange::new(vec![from as i32 + 1], 1, from));
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(db.len(), 8);
    assert_eq!(db.shard_count(), 8);
}

/// 4. LBD adaptation: a producer reports 10x target literals/tick for 5
/// ticks; `lbd_limit` must strictly decrease each tick and stay within
/// `[2, max_clause_size]`.
#[test]
fn lbd_adaptation_decreases_under_overproduction() {
    let target = 10usize;
    let max_clause_size = 32;
    let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(max_clause_size));
    let buffer = Arc::new(ClauseBuffer::new(max_clause_size));

    let producer = LocalProducer::new(0, Arc::clone(&buffer), Box::new(|_limit| {}));
    let horde = HordeSat::new(
        vec![producer],
        Arc::clone(&database),
        target,
        0,
        8.0,
        (2.0, max_clause_size as f64),
        Duration::from_millis(1),
        None,
    );

    let mut previous = horde.lbd_limit_of(0);
    for tick in 0..5 {
        // 10x target literals in clauses of size 2 each.
        for i in 0..(10 * target / 2) {
            buffer.add_clause(ClauseExchange::new(vec![(i * 2 + 1) as i32, (i * 2 + 2) as i32], 2, 0));
        }
        horde.do_sharing();
        let current = horde.lbd_limit_of(0);
        assert!(current < previous, "tick {tick}: {current} should be < {previous}");
        assert!((2.0..=max_clause_size as f64).contains(&current));
        previous = current;
    }
}

/// 5. Termination race: two solvers publish SAT simultaneously; the
/// termination bus resolves to exactly one of the two models, first-writer
/// wins, and the loser observes it should stop.
#[test]
fn termination_race_resolves_to_one_winner() {
    let termination = Termination::new();
    let barrier = Arc::new(std::sync::Barrier::new(2));

    let handles: Vec<_> = [vec![1, 2], vec![-1, -2]]
        .into_iter()
        .enumerate()
        .map(|(rank, model)| {
            let termination = Arc::clone(&termination);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                termination.publish(sharesat_core::dispatch::report::Solve::Satisfiable, Some(model), rank as u32)
            })
        })
        .collect();

    let wins: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(wins.iter().filter(|&&w| w).count(), 1);
    assert!(termination.should_stop());

    let (result, model, _winner) = termination.result().unwrap();
    assert_eq!(result, sharesat_core::dispatch::report::Solve::Satisfiable);
    let model = model.unwrap();
    assert!(model == vec![1, 2] || model == vec![-1, -2]);
}

/// 6. Ring no-storm: world size 4, each rank seeds one unique clause. After
/// at most 3 ticks every clause has been delivered to every other rank
/// exactly once.
#[test]
fn ring_delivers_every_clause_within_bounded_hops() {
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

    let world = 4;
    let cluster = ChannelTransport::cluster(world);
    let sinks: Vec<Arc<Sink>> = (0..world).map(|_| Arc::new(Sink(AtomicUsize::new(0)))).collect();

    let handles: Vec<_> = cluster
        .into_iter()
        .zip(sinks.iter().cloned())
        .map(|(transport, sink)| {
            thread::spawn(move || {
                let rank = transport.rank();
                let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(8));
                database.add_clause(ClauseExchange::new(vec![rank as i32 + 1, rank as i32 + 2], 1, rank));

                let ring = Ring::new(transport, database, 1000, 64, Duration::from_millis(1), None);
                ring.add_consumer(sink);
                assert!(ring.init_transport());
                for _ in 0..(world - 1) {
                    ring.do_sharing();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for sink in &sinks {
        assert_eq!(sink.0.load(Ordering::SeqCst), (world - 1) as usize);
    }
}
