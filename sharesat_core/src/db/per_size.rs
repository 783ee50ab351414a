//! [PerSize]: an array of per-literal-count buckets, short clauses first.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::clause::ClauseExchange;
use crate::db::ClauseDatabase;
use crate::misc::log::targets;

/// Dispatches clauses into `max_clause_size + 1` buckets by literal count and
/// selects short clauses before long ones.
pub struct PerSize {
    max_clause_size: usize,
    /// Index `0` is unused (no clause has size zero); index `s` holds clauses
    /// of exactly `s` literals.
    buckets: Vec<Mutex<VecDeque<ClauseExchange>>>,
    len: AtomicUsize,
}

impl PerSize {
    /// Creates an empty database accepting clauses of up to `max_clause_size`
    /// literals.
    pub fn new(max_clause_size: usize) -> Self {
        let mut buckets = Vec::with_capacity(max_clause_size + 1);
        for _ in 0..=max_clause_size {
            buckets.push(Mutex::new(VecDeque::new()));
        }
        PerSize {
            max_clause_size,
            buckets,
            len: AtomicUsize::new(0),
        }
    }

    /// The size bound this database enforces.
    pub fn max_clause_size(&self) -> usize {
        self.max_clause_size
    }
}

impl ClauseDatabase for PerSize {
    fn add_clause(&self, clause: ClauseExchange) -> bool {
        let size = clause.size();
        if size == 0 || size > self.max_clause_size {
            log::trace!(target: targets::DATABASE, "Rejected clause of size {size} over cap {}", self.max_clause_size);
            return false;
        }
        self.buckets[size].lock().unwrap().push_back(clause);
        self.len.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn give_selection(&self, literal_budget: usize) -> Vec<ClauseExchange> {
        let mut remaining = literal_budget;
        let mut selection = Vec::new();
        for size in 1..=self.max_clause_size {
            if remaining < size {
                continue;
            }
            let mut bucket = self.buckets[size].lock().unwrap();
            while remaining >= size {
                match bucket.pop_front() {
                    Some(clause) => {
                        remaining -= size;
                        selection.push(clause);
                    }
                    None => break,
                }
            }
        }
        self.len.fetch_sub(selection.len(), Ordering::Relaxed);
        log::trace!(target: targets::DATABASE, "Gave selection of {} clauses within budget {literal_budget}", selection.len());
        selection
    }

    fn clear(&self) {
        let mut cleared = 0;
        for bucket in &self.buckets {
            let mut bucket = bucket.lock().unwrap();
            cleared += bucket.len();
            bucket.clear();
        }
        self.len.fetch_sub(cleared, Ordering::Relaxed);
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}
