//! [Ring]: each rank has one left producer and one right consumer. A clause
//! entering the ring is forwarded to local consumers and re-published for one
//! further hop, bounded by a hop counter at `group_size - 1` and by
//! fingerprint deduplication (design note 9: the hop counter is a backstop,
//! fingerprinting is the primary guard).
//!
//! The ring wraps within the caller's group — `[group_base, group_base +
//! group_size)` — rather than across the whole transport world, mirroring
//! `PortfolioPRS.cpp::computeNodeGroup`'s group-scoped `left_neighbor`/
//! `right_neighbor`. [Ring::new] defaults to a single group spanning the
//! entire world; [Ring::new_in_group] is for a caller (PRS) that has already
//! partitioned ranks into groups.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam::channel::Sender;

use crate::clause::ClauseExchange;
use crate::db::ClauseDatabase;
use crate::dedup::DedupSet;
use crate::dispatch::{stat, Dispatch};
use crate::error;
use crate::global::{GlobalSharingStrategy, Transport};
use crate::misc::log::targets;
use crate::sharing::SharingEntity;

/// One clause in transit, carrying how many hops it has already travelled.
struct Hopped {
    hop: u32,
    clause: ClauseExchange,
}

fn encode_envelope(items: &[Hopped]) -> Vec<u8> {
    let mut buf = Vec::new();
    leb128::write::unsigned(&mut buf, items.len() as u64).unwrap();
    for item in items {
        leb128::write::unsigned(&mut buf, item.hop as u64).unwrap();
        leb128::write::unsigned(&mut buf, item.clause.size() as u64).unwrap();
        leb128::write::unsigned(&mut buf, item.clause.lbd() as u64).unwrap();
        for &lit in item.clause.literals() {
            leb128::write::signed(&mut buf, lit as i64).unwrap();
        }
    }
    buf
}

fn decode_envelope(bytes: &[u8]) -> Result<Vec<Hopped>, error::Transport> {
    let mut cursor = Cursor::new(bytes);
    let count = leb128::read::unsigned(&mut cursor).map_err(|_| error::Transport::MalformedPayload)?;
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let hop = leb128::read::unsigned(&mut cursor).map_err(|_| error::Transport::MalformedPayload)? as u32;
        let size = leb128::read::unsigned(&mut cursor).map_err(|_| error::Transport::MalformedPayload)? as usize;
        let lbd = leb128::read::unsigned(&mut cursor).map_err(|_| error::Transport::MalformedPayload)? as u32;
        let mut literals = Vec::with_capacity(size);
        for _ in 0..size {
            let lit = leb128::read::signed(&mut cursor).map_err(|_| error::Transport::MalformedPayload)?;
            literals.push(lit as i32);
        }
        if literals.is_empty() {
            return Err(error::Transport::MalformedPayload);
        }
        items.push(Hopped {
            hop,
            clause: ClauseExchange::new(literals, lbd, 0),
        });
    }
    Ok(items)
}

pub struct Ring {
    transport: Arc<dyn Transport>,
    database: Arc<dyn ClauseDatabase>,
    consumers: Mutex<Vec<Arc<dyn SharingEntity>>>,
    literal_budget: usize,
    period: Duration,
    seen: Mutex<DedupSet>,
    /// Clauses received from the left neighbour, awaiting re-publication one
    /// further hop to the right.
    forward_queue: Mutex<VecDeque<Hopped>>,
    dispatcher: Option<Sender<Dispatch>>,
    /// First rank of this ring's group; neighbours wrap within
    /// `[group_base, group_base + group_size)`.
    group_base: u32,
    group_size: u32,
}

impl Ring {
    /// A ring spanning the whole transport world — one group, same as not
    /// partitioning at all.
    pub fn new(
        transport: Arc<dyn Transport>,
        database: Arc<dyn ClauseDatabase>,
        literal_budget: usize,
        dedup_capacity: usize,
        period: Duration,
        dispatcher: Option<Sender<Dispatch>>,
    ) -> Self {
        let group_size = transport.world_size();
        Self::new_in_group(transport, database, literal_budget, dedup_capacity, period, dispatcher, 0, group_size)
    }

    /// A ring confined to the rank range `[group_base, group_base +
    /// group_size)`. The caller's own rank (`transport.rank()`) must fall
    /// within that range.
    #[allow(clippy::too_many_arguments)]
    pub fn new_in_group(
        transport: Arc<dyn Transport>,
        database: Arc<dyn ClauseDatabase>,
        literal_budget: usize,
        dedup_capacity: usize,
        period: Duration,
        dispatcher: Option<Sender<Dispatch>>,
        group_base: u32,
        group_size: u32,
    ) -> Self {
        Ring {
            transport,
            database,
            consumers: Mutex::new(Vec::new()),
            literal_budget,
            period,
            seen: Mutex::new(DedupSet::new(dedup_capacity)),
            forward_queue: Mutex::new(VecDeque::new()),
            dispatcher,
            group_base,
            group_size,
        }
    }

    pub fn add_consumer(&self, consumer: Arc<dyn SharingEntity>) {
        self.consumers.lock().unwrap().push(consumer);
    }

    fn rank_in_group(&self) -> u32 {
        self.transport.rank() - self.group_base
    }

    fn left(&self) -> u32 {
        let size = self.group_size.max(1);
        self.group_base + (self.rank_in_group() + size - 1) % size
    }

    fn right(&self) -> u32 {
        let size = self.group_size.max(1);
        self.group_base + (self.rank_in_group() + 1) % size
    }

    fn max_hops(&self) -> u32 {
        self.group_size.saturating_sub(1)
    }

    fn exchange(&self) -> Result<(), error::Transport> {
        if self.group_size <= 1 {
            return Ok(());
        }

        // Freshly produced local clauses enter the ring at hop 0; clauses
        // already in transit keep their recorded hop count.
        let mut remaining = self.literal_budget;
        let mut outgoing = Vec::new();
        {
            let mut queue = self.forward_queue.lock().unwrap();
            while let Some(front) = queue.front() {
                if front.clause.size() > remaining {
                    break;
                }
                let item = queue.pop_front().unwrap();
                remaining -= item.clause.size();
                outgoing.push(item);
            }
        }
        for clause in self.database.give_selection(remaining) {
            outgoing.push(Hopped { hop: 0, clause });
        }

        let payload = encode_envelope(&outgoing);
        let bytes_sent = payload.len();
        log::trace!(target: targets::GLOBAL, "Ring: sending {} clause(s), {bytes_sent} bytes, to rank {}", outgoing.len(), self.right());
        self.transport.send(self.right(), payload)?;

        let incoming = self.transport.recv(self.left())?;
        let bytes_received = incoming.len();
        let received = decode_envelope(&incoming)?;

        let mut fresh = Vec::new();
        let mut to_forward = Vec::new();
        {
            let mut seen = self.seen.lock().unwrap();
            for item in received {
                if seen.check_and_insert(item.clause.fingerprint()) {
                    continue;
                }
                let next_hop = item.hop + 1;
                fresh.push(item.clause.clone());
                if next_hop < self.max_hops() {
                    to_forward.push(Hopped {
                        hop: next_hop,
                        clause: item.clause,
                    });
                }
            }
        }

        let consumers = self.consumers.lock().unwrap();
        for consumer in consumers.iter() {
            consumer.import_clauses(&fresh);
        }
        drop(consumers);

        self.forward_queue.lock().unwrap().extend(to_forward);
        log::trace!(target: targets::GLOBAL, "Ring: received {} clause(s), {bytes_received} bytes, from rank {}", fresh.len(), self.left());

        if let Some(tx) = &self.dispatcher {
            let _ = tx.send(Dispatch::Stat(stat::Stat::GlobalExchange {
                rank: self.transport.rank(),
                bytes_sent,
                bytes_received,
            }));
        }
        Ok(())
    }
}

impl GlobalSharingStrategy for Ring {
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
