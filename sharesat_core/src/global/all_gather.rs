//! [AllGather]: every rank contributes a bounded payload; every rank
//! receives every other rank's payload.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam::channel::Sender;

use crate::db::ClauseDatabase;
use crate::dispatch::{stat, Dispatch};
use crate::error;
use crate::global::{GlobalSharingStrategy, Transport};
use crate::sharing::SharingEntity;
use crate::wire;

pub struct AllGather {
    transport: Arc<dyn Transport>,
    database: Arc<dyn ClauseDatabase>,
    consumers: Mutex<Vec<Arc<dyn SharingEntity>>>,
    literal_budget: usize,
    period: Duration,
    dispatcher: Option<Sender<Dispatch>>,
}

impl AllGather {
    pub fn new(
        transport: Arc<dyn Transport>,
        database: Arc<dyn ClauseDatabase>,
        literal_budget: usize,
        period: Duration,
        dispatcher: Option<Sender<Dispatch>>,
    ) -> Self {
        AllGather {
            transport,
            database,
            consumers: Mutex::new(Vec::new()),
            literal_budget,
            period,
            dispatcher,
        }
    }

    pub fn add_consumer(&self, consumer: Arc<dyn SharingEntity>) {
        self.consumers.lock().unwrap().push(consumer);
    }

    fn exchange(&self) -> Result<(), error::Transport> {
        let outgoing = self.database.give_selection(self.literal_budget);
        let payload = wire::encode_bounded(&outgoing, self.literal_budget);
        let bytes_sent = payload.len();

        let gathered = self.transport.allgather(payload)?;

        let mut bytes_received = 0;
        let my_rank = self.transport.rank();
        let consumers = self.consumers.lock().unwrap();
        for (rank, bytes) in gathered.iter().enumerate() {
            if rank as u32 == my_rank {
                continue;
            }
            bytes_received += bytes.len();
            // External/global provenance: spec §3 reserves `from == 0` for
            // clauses not attributable to a single local producer.
            if let Ok(clauses) = wire::decode_payload(bytes, 0) {
                for consumer in consumers.iter() {
                    consumer.import_clauses(&clauses);
                }
            }
        }
        drop(consumers);

        if let Some(tx) = &self.dispatcher {
            let _ = tx.send(Dispatch::Stat(stat::Stat::GlobalExchange {
                rank: my_rank,
                bytes_sent,
                bytes_received,
            }));
        }
        Ok(())
    }
}

impl GlobalSharingStrategy for AllGather {
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
    fn every_rank_receives_every_other_ranks_clauses() {
        let cluster = ChannelTransport::cluster(3);
        let handles: Vec<_> = cluster
            .into_iter()
            .map(|transport| {
                thread::spawn(move || {
                    let rank = transport.rank();
                    let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(8));
                    database.add_clause(ClauseExchange::new(vec![rank as i32 + 1, rank as i32 + 2], 1, rank));

                    let sink = Arc::new(Sink(AtomicUsize::new(0)));
                    let strategy = AllGather::new(transport, database, 1000, Duration::from_millis(1), None);
                    strategy.add_consumer(sink.clone());
                    assert!(strategy.init_transport());
                    strategy.do_sharing();
                    sink.0.load(Ordering::SeqCst)
                })
            })
            .collect();
        for h in handles {
            // each rank seeded 1 clause; sees the other 2 ranks' clauses.
            assert_eq!(h.join().unwrap(), 2);
        }
    }
}
