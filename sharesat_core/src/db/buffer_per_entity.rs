//! [BufferPerEntity]: a reader/writer-locked shard map from producer id to a
//! [ClauseBuffer](crate::buffer::ClauseBuffer).
//!
//! The lock bounds critical-section time to shard-map maintenance, never to a
//! solver's own `add_clause`/drain work: the fast path for an existing shard
//! takes the lock only long enough to clone the `Arc` to that shard's buffer.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::buffer::ClauseBuffer;
use crate::clause::ClauseExchange;
use crate::db::per_size::PerSize;
use crate::db::ClauseDatabase;
use crate::misc::log::targets;

/// A clause database sharded by producer id, one [ClauseBuffer] per producer.
pub struct BufferPerEntity {
    max_clause_size: usize,
    shards: RwLock<HashMap<u32, Arc<ClauseBuffer>>>,
}

impl BufferPerEntity {
    /// Creates an empty, shard-less database. Shards are created lazily on
    /// first `add_clause` from a given producer.
    pub fn new(max_clause_size: usize) -> Self {
        BufferPerEntity {
            max_clause_size,
            shards: RwLock::new(HashMap::new()),
        }
    }

    /// Number of distinct producer shards created so far.
    pub fn shard_count(&self) -> usize {
        self.shards.read().unwrap().len()
    }

    fn shard_for(&self, from: u32) -> Arc<ClauseBuffer> {
        // Fast path: the shard already exists, a shared lock suffices.
        {
            let shards = self.shards.read().unwrap();
            if let Some(shard) = shards.get(&from) {
                return Arc::clone(shard);
            }
        }
        // Slow path: take the exclusive lock and re-check, since another
        // producer may have created the shard between our read lock
        // releasing and us acquiring the write lock.
        let mut shards = self.shards.write().unwrap();
        if let Some(shard) = shards.get(&from) {
            return Arc::clone(shard);
        }
        let shard = Arc::new(ClauseBuffer::new(self.max_clause_size));
        shards.insert(from, Arc::clone(&shard));
        log::debug!(target: targets::DATABASE, "Created shard for producer {from}");
        shard
    }
}

impl ClauseDatabase for BufferPerEntity {
    fn add_clause(&self, clause: ClauseExchange) -> bool {
        let from = clause.from();
        let shard = self.shard_for(from);
        shard.add_clause(clause)
    }

    fn give_selection(&self, literal_budget: usize) -> Vec<ClauseExchange> {
        // Bound the critical section to the drain itself: collect `Arc`
        // clones under the shared lock, then drain outside of it.
        let shard_handles: Vec<Arc<ClauseBuffer>> = {
            let shards = self.shards.read().unwrap();
            shards.values().cloned().collect()
        };

        let transient = PerSize::new(self.max_clause_size);
        for shard in &shard_handles {
            let mut drained = Vec::new();
            shard.get_clauses(&mut drained);
            for clause in drained {
                transient.add_clause(clause);
            }
        }
        transient.give_selection(literal_budget)
    }

    fn clear(&self) {
        let shards = self.shards.read().unwrap();
        for shard in shards.values() {
            shard.clear();
        }
    }

    fn len(&self) -> usize {
        self.shards
            .read()
            .unwrap()
            .values()
            .map(|shard| shard.size())
            .sum()
    }
}
