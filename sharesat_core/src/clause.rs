//! [ClauseExchange], the reference-counted unit of inter-solver communication.
//!
//! A clause is immutable once published and is shared by reference count: it is
//! destroyed when the last consumer drops its handle. There are no cycles — a
//! clause never points back at its consumers — so a plain [Arc] is enough, no
//! cycle collector needed.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The literal payload and provenance of one learned clause, boxed once behind
/// an `Arc` so every consumer shares the same allocation.
#[derive(Debug)]
struct Inner {
    literals: Box<[i32]>,
    lbd: u32,
    from: u32,
    id: Option<u64>,
}

/// A learned clause, shared by reference count.
///
/// `from` identifies the producing entity (`0` means external/global, i.e. not
/// attributable to a single producer). `id`, when present, is a monotonically
/// assigned identifier used for deduplication across databases.
#[derive(Clone, Debug)]
pub struct ClauseExchange {
    inner: Arc<Inner>,
}

impl ClauseExchange {
    /// Builds a clause from its literals, LBD score, and producing entity.
    ///
    /// # Panics
    ///
    /// Panics if `literals` is empty. An empty clause denotes UNSAT at a layer
    /// above clause exchange; this constructor never sees one in a correctly
    /// operating solver, so an empty slice here is a programmer error, not a
    /// runtime condition to recover from.
    pub fn new(literals: Vec<i32>, lbd: u32, from: u32) -> Self {
        assert!(!literals.is_empty(), "cannot exchange an empty clause");
        ClauseExchange {
            inner: Arc::new(Inner {
                literals: literals.into_boxed_slice(),
                lbd,
                from,
                id: None,
            }),
        }
    }

    /// Builds a clause with an explicit dedup id already assigned.
    pub fn with_id(literals: Vec<i32>, lbd: u32, from: u32, id: u64) -> Self {
        assert!(!literals.is_empty(), "cannot exchange an empty clause");
        ClauseExchange {
            inner: Arc::new(Inner {
                literals: literals.into_boxed_slice(),
                lbd,
                from,
                id: Some(id),
            }),
        }
    }

    /// The clause's literals, in the order they were published.
    pub fn literals(&self) -> &[i32] {
        &self.inner.literals
    }

    /// Number of literals.
    pub fn size(&self) -> usize {
        self.inner.literals.len()
    }

    /// The literal block distance recorded at export time.
    pub fn lbd(&self) -> u32 {
        self.inner.lbd
    }

    /// The id of the producing entity, or `0` for external/global clauses.
    pub fn from(&self) -> u32 {
        self.inner.from
    }

    /// The dedup id, if one has been assigned.
    pub fn id(&self) -> Option<u64> {
        self.inner.id
    }

    /// Number of live references to this clause, including this one.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// A sorted copy of the literals, for strategies that need a canonical
    /// ordering (hashing, fingerprinting) without disturbing the stored order.
    pub fn sorted_literals(&self) -> Vec<i32> {
        let mut sorted = self.inner.literals.to_vec();
        sorted.sort_unstable();
        sorted
    }

    /// A 64-bit fingerprint over the sorted literal multiset, commutative in
    /// the original (unsorted) literal order — two clauses with the same
    /// literals in any order hash identically.
    pub fn fingerprint(&self) -> u64 {
        let mut acc: u64 = 0;
        for &lit in self.inner.literals.iter() {
            acc ^= mix_literal(lit);
        }
        acc
    }
}

/// A small avalanche mix so that XOR-folding per-literal hashes does not leave
/// obvious structure (e.g. `x ^ -x` collapsing to the sign bit alone).
fn mix_literal(lit: i32) -> u64 {
    let mut x = lit as i64 as u64;
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51afd7ed558ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ceb9fe1a85ec53);
    x ^= x >> 33;
    x
}

impl PartialEq for ClauseExchange {
    /// Two clauses are equal iff they carry the same literals up to order.
    fn eq(&self, other: &Self) -> bool {
        self.inner.literals.len() == other.inner.literals.len()
            && self.sorted_literals() == other.sorted_literals()
    }
}

impl Eq for ClauseExchange {}

impl Hash for ClauseExchange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint().hash(state);
    }
}

impl Ord for ClauseExchange {
    /// Size-then-LBD ordering, the order Mallob-style selection walks cells in.
    fn cmp(&self, other: &Self) -> Ordering {
        self.size()
            .cmp(&other.size())
            .then_with(|| self.lbd().cmp(&other.lbd()))
    }
}

impl PartialOrd for ClauseExchange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_literal_order() {
        let a = ClauseExchange::new(vec![1, -2, 3], 2, 1);
        let b = ClauseExchange::new(vec![3, 1, -2], 2, 2);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn distinct_clauses_differ() {
        let a = ClauseExchange::new(vec![1, 2], 1, 0);
        let b = ClauseExchange::new(vec![1, -2], 1, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn dropping_all_handles_frees_storage() {
        let c = ClauseExchange::new(vec![1, 2, 3], 3, 7);
        let clone = c.clone();
        assert_eq!(c.ref_count(), 2);
        drop(clone);
        assert_eq!(c.ref_count(), 1);
    }

    #[test]
    #[should_panic]
    fn empty_clause_panics() {
        let _ = ClauseExchange::new(vec![], 0, 0);
    }

    #[test]
    fn size_then_lbd_ordering() {
        let short = ClauseExchange::new(vec![1, 2], 1, 0);
        let long = ClauseExchange::new(vec![1, 2, 3], 0, 0);
        assert!(short < long);
        let low_lbd = ClauseExchange::new(vec![1, 2], 1, 0);
        let high_lbd = ClauseExchange::new(vec![3, 4], 5, 0);
        assert!(low_lbd < high_lbd);
    }
}
