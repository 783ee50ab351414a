//! [HordeSat]: adapts each producer's LBD export threshold toward a target
//! rate of shared literals per tick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam::channel::Sender;

use crate::config::defaults;
use crate::db::ClauseDatabase;
use crate::dispatch::{delta, stat, Dispatch};
use crate::local::{LocalProducer, LocalSharingStrategy};
use crate::misc::log::targets;
use crate::sharing::SharingEntity;

struct ProducerState {
    lbd_limit: f64,
    init_remaining: u32,
}

/// HordeSat-style local sharing: gathers from every producer, selects under a
/// budget scaled by producer count, delivers to every consumer, then adapts
/// each producer's `lbdLimit` toward `target_literals_per_producer`.
pub struct HordeSat {
    producers: Vec<LocalProducer>,
    consumers: Mutex<Vec<Arc<dyn SharingEntity>>>,
    database: Arc<dyn ClauseDatabase>,
    target_literals_per_producer: usize,
    init_round: u32,
    initial_lbd_limit: f64,
    lbd_envelope: (f64, f64),
    period: Duration,
    state: Mutex<HashMap<u32, ProducerState>>,
    dispatcher: Option<Sender<Dispatch>>,
}

impl HordeSat {
    pub fn new(
        producers: Vec<LocalProducer>,
        database: Arc<dyn ClauseDatabase>,
        target_literals_per_producer: usize,
        init_round: u32,
        initial_lbd_limit: f64,
        lbd_envelope: (f64, f64),
        period: Duration,
        dispatcher: Option<Sender<Dispatch>>,
    ) -> Self {
        let mut state = HashMap::new();
        for producer in &producers {
            state.insert(
                producer.id,
                ProducerState {
                    lbd_limit: initial_lbd_limit,
                    init_remaining: init_round,
                },
            );
        }
        HordeSat {
            producers,
            consumers: Mutex::new(Vec::new()),
            database,
            target_literals_per_producer,
            init_round,
            initial_lbd_limit,
            lbd_envelope,
            period,
            state: Mutex::new(state),
            dispatcher,
        }
    }

    /// The current LBD limit for `producer`, or the initial limit if unknown.
    pub fn lbd_limit_of(&self, producer: u32) -> f64 {
        self.state
            .lock()
            .unwrap()
            .get(&producer)
            .map(|s| s.lbd_limit)
            .unwrap_or(self.initial_lbd_limit)
    }

    fn dispatch(&self, event: Dispatch) {
        if let Some(tx) = &self.dispatcher {
            let _ = tx.send(event);
        }
    }
}

impl LocalSharingStrategy for HordeSat {
    fn do_sharing(&self) {
        let mut literals_by_producer: HashMap<u32, usize> = HashMap::new();

        for producer in &self.producers {
            let mut drained = Vec::new();
            producer.buffer.get_clauses(&mut drained);
            let mut literals = 0;
            for clause in drained {
                literals += clause.size();
                if self.database.add_clause(clause.clone()) {
                    self.dispatch(Dispatch::Delta(delta::Delta::Database(
                        delta::Database::Accepted { size: clause.size() },
                    )));
                } else {
                    self.dispatch(Dispatch::Delta(delta::Delta::Database(
                        delta::Database::Rejected { size: clause.size() },
                    )));
                }
            }
            literals_by_producer.insert(producer.id, literals);
        }

        let producer_count = self.producers.len().max(1);
        let budget = self.target_literals_per_producer * producer_count;
        let shared = self.database.give_selection(budget);

        let consumers = self.consumers.lock().unwrap();
        for consumer in consumers.iter() {
            consumer.import_clauses(&shared);
        }
        drop(consumers);

        let mut state = self.state.lock().unwrap();
        for producer in &self.producers {
            let produced = *literals_by_producer.get(&producer.id).unwrap_or(&0);
            let entry = state.entry(producer.id).or_insert_with(|| ProducerState {
                lbd_limit: self.initial_lbd_limit,
                init_remaining: self.init_round,
            });

            if entry.init_remaining > 0 {
                entry.init_remaining -= 1;
                continue;
            }

            let target = self.target_literals_per_producer as f64;
            let lower_bound = target * (1.0 - defaults::ADAPTATION_EPSILON);
            let upper_bound = target * (1.0 + defaults::ADAPTATION_EPSILON);
            let produced = produced as f64;

            if produced < lower_bound {
                entry.lbd_limit += defaults::ADAPTATION_STEP * entry.lbd_limit;
            } else if produced > upper_bound {
                entry.lbd_limit -= defaults::ADAPTATION_STEP * entry.lbd_limit;
            }
            entry.lbd_limit = entry.lbd_limit.clamp(self.lbd_envelope.0, self.lbd_envelope.1);

            (producer.set_lbd_limit)(entry.lbd_limit);
            log::debug!(target: targets::LOCAL, "Producer {} lbd_limit adapted to {:.3}", producer.id, entry.lbd_limit);
            self.dispatch(Dispatch::Delta(delta::Delta::Strategy(
                delta::Strategy::LbdLimitAdapted {
                    producer: producer.id,
                    new_limit: entry.lbd_limit,
                },
            )));
        }
        drop(state);

        log::trace!(target: targets::LOCAL, "Tick: selected {} clauses within budget {budget}", shared.len());
        self.dispatch(Dispatch::Stat(stat::Stat::LocalTick(stat::Tick {
            exported_literals: literals_by_producer.values().sum(),
            filtered_clauses: 0,
            imported_clauses: shared.len(),
        })));
    }

    fn period(&self) -> Duration {
        self.period
    }

    fn add_consumer(&self, consumer: Arc<dyn SharingEntity>) {
        self.consumers.lock().unwrap().push(consumer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ClauseBuffer;
    use crate::clause::ClauseExchange;
    use crate::db::per_size::PerSize;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn producer_with(id: u32, limit_slot: Arc<Mutex<f64>>) -> LocalProducer {
        let buffer = Arc::new(ClauseBuffer::new(32));
        LocalProducer::new(
            id,
            buffer,
            Box::new(move |limit| *limit_slot.lock().unwrap() = limit),
        )
    }

    #[test]
    fn lbd_limit_decreases_under_sustained_overproduction() {
        let limit_slot = Arc::new(Mutex::new(0.0));
        let producer = producer_with(1, Arc::clone(&limit_slot));
        let buffer = Arc::clone(&producer.buffer);
        let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(16));

        let horde = HordeSat::new(
            vec![producer],
            database,
            /* target */ 10,
            /* init_round */ 0,
            /* initial_lbd_limit */ 8.0,
            (2.0, 16.0),
            Duration::from_millis(1),
            None,
        );

        let mut previous = 8.0;
        for tick in 0..5 {
            // 10x the target, every tick.
            for i in 0..100 {
                buffer.add_clause(ClauseExchange::new(vec![(i % 16) as i32 + 1], 2, 1));
            }
            horde.do_sharing();
            let current = *limit_slot.lock().unwrap();
            assert!(
                current < previous,
                "tick {tick}: expected strict decrease, {current} >= {previous}"
            );
            assert!((2.0..=16.0).contains(&current));
            previous = current;
        }
    }

    #[test]
    fn init_round_suppresses_adaptation() {
        let limit_slot = Arc::new(Mutex::new(0.0));
        let producer = producer_with(1, Arc::clone(&limit_slot));
        let buffer = Arc::clone(&producer.buffer);
        let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(16));

        let horde = HordeSat::new(
            vec![producer],
            database,
            10,
            3,
            8.0,
            (2.0, 16.0),
            Duration::from_millis(1),
            None,
        );

        for _ in 0..3 {
            buffer.add_clause(ClauseExchange::new(vec![1], 2, 1));
            horde.do_sharing();
            assert_eq!(*limit_slot.lock().unwrap(), 0.0); // callback never invoked yet
        }
    }

    #[test]
    fn selection_is_delivered_to_every_consumer() {
        struct Counter(AtomicU32);
        impl SharingEntity for Counter {
            fn add_client(&self, _client: Arc<dyn SharingEntity>) {}
            fn add_producer(&self, _producer: Arc<dyn SharingEntity>) {}
            fn import_clauses(&self, clauses: &[ClauseExchange]) {
                self.0.fetch_add(clauses.len() as u32, Ordering::SeqCst);
            }
            fn entity_id(&self) -> u32 {
                99
            }
        }

        let producer = producer_with(1, Arc::new(Mutex::new(0.0)));
        let buffer = Arc::clone(&producer.buffer);
        buffer.add_clause(ClauseExchange::new(vec![1, 2], 1, 1));

        let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(16));
        let horde = HordeSat::new(vec![producer], database, 10, 0, 8.0, (2.0, 16.0), Duration::from_millis(1), None);

        let counter = Arc::new(Counter(AtomicU32::new(0)));
        horde.add_consumer(counter.clone());
        horde.do_sharing();

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
