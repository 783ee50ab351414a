//! [Mallob]: a size x LBD priority grid with bounded fingerprint deduplication.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::clause::ClauseExchange;
use crate::db::ClauseDatabase;
use crate::dedup::DedupSet;
use crate::misc::log::targets;

/// Ring buffer holding at most `capacity` clauses, evicting the oldest on
/// overflow.
struct Cell {
    capacity: usize,
    clauses: VecDeque<ClauseExchange>,
}

impl Cell {
    fn new(capacity: usize) -> Self {
        Cell {
            capacity: capacity.max(1),
            clauses: VecDeque::new(),
        }
    }

    fn push(&mut self, clause: ClauseExchange) -> bool {
        let evicted = if self.clauses.len() >= self.capacity {
            self.clauses.pop_front().is_some()
        } else {
            false
        };
        self.clauses.push_back(clause);
        evicted
    }
}

struct Grid {
    max_size: usize,
    max_lbd: u32,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    fn new(max_size: usize, max_lbd: u32, cell_capacity: usize) -> Self {
        let rows = max_size + 1;
        let cols = max_lbd as usize + 1;
        let mut cells = Vec::with_capacity(rows);
        for _ in 0..rows {
            let mut row = Vec::with_capacity(cols);
            for _ in 0..cols {
                row.push(Cell::new(cell_capacity));
            }
            cells.push(row);
        }
        Grid {
            max_size,
            max_lbd,
            cells,
        }
    }
}

/// A size x LBD priority database with bounded clause-id deduplication, as
/// described for Mallob-style global sharing.
pub struct Mallob {
    max_size: usize,
    max_lbd: u32,
    grid: Mutex<Grid>,
    dedup: Mutex<DedupSet>,
    len: AtomicUsize,
}

impl Mallob {
    /// Creates an empty database. Clauses larger than `max_size` literals or
    /// with LBD greater than `max_lbd` are dropped at admission; at most
    /// `cell_capacity` clauses are retained per `(size, lbd)` cell;
    /// `dedup_capacity` bounds the fingerprint-dedup window.
    pub fn new(max_size: usize, max_lbd: u32, cell_capacity: usize, dedup_capacity: usize) -> Self {
        Mallob {
            max_size,
            max_lbd,
            grid: Mutex::new(Grid::new(max_size, max_lbd, cell_capacity)),
            dedup: Mutex::new(DedupSet::new(dedup_capacity)),
            len: AtomicUsize::new(0),
        }
    }

    /// Selection with per-call filters tighter than (or equal to) the
    /// construction-time `max_size`/`max_lbd`.
    pub fn give_selection_filtered(
        &self,
        literal_budget: usize,
        max_size: usize,
        max_lbd: u32,
    ) -> Vec<ClauseExchange> {
        let size_bound = max_size.min(self.max_size);
        let lbd_bound = max_lbd.min(self.max_lbd);
        let mut remaining = literal_budget;
        let mut selection = Vec::new();
        let mut grid = self.grid.lock().unwrap();
        'outer: for size in 1..=size_bound {
            if remaining < size {
                continue;
            }
            for lbd in 0..=lbd_bound {
                let cell = &mut grid.cells[size][lbd as usize];
                while remaining >= size {
                    match cell.clauses.pop_front() {
                        Some(clause) => {
                            remaining -= size;
                            selection.push(clause);
                        }
                        None => break,
                    }
                }
                if remaining == 0 {
                    break 'outer;
                }
            }
        }
        self.len.fetch_sub(selection.len(), Ordering::Relaxed);
        selection
    }
}

impl ClauseDatabase for Mallob {
    fn add_clause(&self, clause: ClauseExchange) -> bool {
        let fingerprint = clause.fingerprint();
        {
            let mut dedup = self.dedup.lock().unwrap();
            if dedup.check_and_insert(fingerprint) {
                log::trace!(target: targets::DATABASE, "Dropped duplicate clause, fingerprint {fingerprint:#x}");
                return false;
            }
        }

        let size = clause.size();
        let lbd = clause.lbd();
        if size == 0 || size > self.max_size || lbd > self.max_lbd {
            log::trace!(target: targets::DATABASE, "Rejected clause size {size} lbd {lbd} outside bounds [{}, {}]", self.max_size, self.max_lbd);
            return false;
        }

        let mut grid = self.grid.lock().unwrap();
        let evicted = grid.cells[size][lbd as usize].push(clause);
        if !evicted {
            self.len.fetch_add(1, Ordering::Relaxed);
        }
        true
    }

    fn give_selection(&self, literal_budget: usize) -> Vec<ClauseExchange> {
        self.give_selection_filtered(literal_budget, self.max_size, self.max_lbd)
    }

    fn clear(&self) {
        let mut grid = self.grid.lock().unwrap();
        for row in grid.cells.iter_mut() {
            for cell in row.iter_mut() {
                cell.clauses.clear();
            }
        }
        self.len.store(0, Ordering::Relaxed);
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_within_epoch_yields_once() {
        let db = Mallob::new(8, 8, 16, 16);
        let c1 = ClauseExchange::new(vec![1, 2, 3], 2, 0);
        let c2 = ClauseExchange::new(vec![3, 1, 2], 2, 0); // same multiset, different order
        assert!(db.add_clause(c1));
        assert!(!db.add_clause(c2));
        assert_eq!(db.len(), 1);
        let selection = db.give_selection(100);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn oversized_or_high_lbd_dropped() {
        let db = Mallob::new(3, 2, 16, 16);
        let oversized = ClauseExchange::new(vec![1, 2, 3, 4], 1, 0);
        let high_lbd = ClauseExchange::new(vec![1, 2], 5, 0);
        assert!(!db.add_clause(oversized));
        assert!(!db.add_clause(high_lbd));
        assert_eq!(db.len(), 0);
    }

    #[test]
    fn selection_visits_size_then_lbd_ascending() {
        let db = Mallob::new(4, 4, 16, 16);
        db.add_clause(ClauseExchange::new(vec![1, 2, 3], 3, 0));
        db.add_clause(ClauseExchange::new(vec![4, 5], 1, 0));
        db.add_clause(ClauseExchange::new(vec![6, 7], 3, 0));
        let selection = db.give_selection(100);
        let shapes: Vec<(usize, u32)> = selection.iter().map(|c| (c.size(), c.lbd())).collect();
        assert_eq!(shapes, vec![(2, 1), (2, 3), (3, 3)]);
    }

    #[test]
    fn cell_eviction_keeps_size_bounded() {
        let db = Mallob::new(4, 4, 2, 1024);
        for i in 0..5 {
            db.add_clause(ClauseExchange::new(vec![i + 1, i + 2], 1, 0));
        }
        // at most 2 survive in the (2, 1) cell; oldest were evicted.
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn selection_never_exceeds_budget() {
        let db = Mallob::new(4, 4, 16, 16);
        for i in 0..10 {
            db.add_clause(ClauseExchange::new(vec![i * 2 + 1, i * 2 + 2], 2, 0));
        }
        let selection = db.give_selection(5);
        let total: usize = selection.iter().map(|c| c.size()).sum();
        assert!(total <= 5);
    }
}
