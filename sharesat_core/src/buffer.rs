//! [ClauseBuffer], a bounded-size MPSC handle queue.
//!
//! Any number of producers may call [ClauseBuffer::add_clause] concurrently.
//! Draining (`get_clause`/`get_clauses`) is single-consumer: the buffer is
//! meant to be owned by exactly one draining thread at a time, which is
//! enforced here by guarding the receiving end with a mutex rather than left
//! as a documented convention.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};

use crate::clause::ClauseExchange;
use crate::misc::log::targets;

/// A per-producer admission queue with a hard cap on accepted clause size.
pub struct ClauseBuffer {
    max_clause_size: usize,
    tx: Sender<ClauseExchange>,
    rx: Mutex<Receiver<ClauseExchange>>,
    len: AtomicUsize,
}

impl ClauseBuffer {
    /// Creates an empty buffer that rejects any clause longer than
    /// `max_clause_size`.
    pub fn new(max_clause_size: usize) -> Self {
        let (tx, rx) = channel::unbounded();
        ClauseBuffer {
            max_clause_size,
            tx,
            rx: Mutex::new(rx),
            len: AtomicUsize::new(0),
        }
    }

    /// Enqueues a clause. Returns `false` and drops the clause without
    /// enqueuing it if `clause.size() > max_clause_size`. Never blocks.
    pub fn add_clause(&self, clause: ClauseExchange) -> bool {
        if clause.size() > self.max_clause_size {
            log::trace!(target: targets::BUFFER, "Rejected clause of size {} over cap {}", clause.size(), self.max_clause_size);
            return false;
        }
        // The channel is unbounded and the receiving end never closes while
        // `self` is alive, so this can only fail if the buffer itself has
        // already been torn down — which cannot happen through a shared `&self`.
        if self.tx.send(clause).is_ok() {
            self.len.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Dequeues one clause, if any is present. Single-consumer.
    pub fn get_clause(&self) -> Option<ClauseExchange> {
        let rx = self.rx.lock().unwrap();
        match rx.try_recv() {
            Ok(clause) => {
                self.len.fetch_sub(1, Ordering::Relaxed);
                Some(clause)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Atomically steals the current contents into `out`. Single-consumer;
    /// after this returns the buffer is empty to any subsequent producer that
    /// has not yet enqueued.
    pub fn get_clauses(&self, out: &mut Vec<ClauseExchange>) {
        let rx = self.rx.lock().unwrap();
        let mut drained = 0;
        while let Ok(clause) = rx.try_recv() {
            out.push(clause);
            drained += 1;
        }
        if drained > 0 {
            self.len.fetch_sub(drained, Ordering::Relaxed);
        }
    }

    /// Discards every clause currently buffered.
    pub fn clear(&self) {
        let mut discarded = Vec::new();
        self.get_clauses(&mut discarded);
        log::debug!(target: targets::BUFFER, "Cleared {} buffered clauses", discarded.len());
    }

    /// Approximate number of clauses currently buffered.
    pub fn size(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// The admission bound this buffer enforces.
    pub fn max_clause_size(&self) -> usize {
        self.max_clause_size
    }
}
