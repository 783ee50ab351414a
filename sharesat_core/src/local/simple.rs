//! [Simple]: fixed per-tick share limit, no LBD adaptation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam::channel::Sender;

use crate::db::ClauseDatabase;
use crate::dispatch::{delta, stat, Dispatch};
use crate::local::{LocalProducer, LocalSharingStrategy};
use crate::misc::log::targets;
use crate::sharing::SharingEntity;

/// Identical gather/select/deliver structure to [HordeSat](super::horde::HordeSat),
/// with no threshold adaptation and a fixed `simple_share_limit`.
pub struct Simple {
    producers: Vec<LocalProducer>,
    consumers: Mutex<Vec<Arc<dyn SharingEntity>>>,
    database: Arc<dyn ClauseDatabase>,
    share_limit: usize,
    period: Duration,
    dispatcher: Option<Sender<Dispatch>>,
}

impl Simple {
    pub fn new(
        producers: Vec<LocalProducer>,
        database: Arc<dyn ClauseDatabase>,
        share_limit: usize,
        period: Duration,
        dispatcher: Option<Sender<Dispatch>>,
    ) -> Self {
        Simple {
            producers,
            consumers: Mutex::new(Vec::new()),
            database,
            share_limit,
            period,
            dispatcher,
        }
    }

    fn dispatch(&self, event: Dispatch) {
        if let Some(tx) = &self.dispatcher {
            let _ = tx.send(event);
        }
    }
}

impl LocalSharingStrategy for Simple {
    fn do_sharing(&self) {
        let mut exported_literals = 0;
        for producer in &self.producers {
            let mut drained = Vec::new();
            producer.buffer.get_clauses(&mut drained);
            for clause in drained {
                exported_literals += clause.size();
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
        }

        let shared = self.database.give_selection(self.share_limit);
        log::trace!(target: targets::LOCAL, "Tick: selected {} clauses within fixed limit {}", shared.len(), self.share_limit);

        let consumers = self.consumers.lock().unwrap();
        for consumer in consumers.iter() {
            consumer.import_clauses(&shared);
        }
        drop(consumers);

        self.dispatch(Dispatch::Stat(stat::Stat::LocalTick(stat::Tick {
            exported_literals,
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

    #[test]
    fn fixed_limit_never_adapts() {
        let buffer = Arc::new(ClauseBuffer::new(16));
        let producer = LocalProducer::new(1, Arc::clone(&buffer), Box::new(|_| unreachable!("simple never adapts")));
        let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(16));
        let simple = Simple::new(vec![producer], database, 20, Duration::from_millis(1), None);

        buffer.add_clause(ClauseExchange::new(vec![1, 2], 1, 1));
        simple.do_sharing(); // must not invoke the unreachable callback
    }

    #[test]
    fn selection_respects_share_limit() {
        let buffer = Arc::new(ClauseBuffer::new(16));
        let producer = LocalProducer::new(1, Arc::clone(&buffer), Box::new(|_| {}));
        for i in 0..20 {
            buffer.add_clause(ClauseExchange::new(vec![i + 1, i + 2], 1, 1));
        }
        let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(16));
        let simple = Simple::new(vec![producer], database, 10, Duration::from_millis(1), None);
        simple.do_sharing();
        // give_selection was bounded to 10 literals on this tick; the rest
        // remain in the database for the next.
    }
}
