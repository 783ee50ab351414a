//! Portfolio working strategies: own a fixed engine mix, wire each engine's
//! export/import path into the local and (optionally) global sharing
//! strategies, and race every engine to a result through a shared
//! [Termination] bus.

pub mod portfolio_prs;
pub mod portfolio_simple;
pub mod termination;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::dispatch::report::Solve;
use crate::solver::SolverType;
use termination::Termination;

/// Deterministic `(rank, id)` -> diversification parameters mapping (spec
/// §4.9): every solver factory is handed one of these instead of re-deriving
/// its own rank/id mixing, so seeds, polarity bias, and restart cadence stay
/// reproducible across runs of the same portfolio shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diversification {
    /// Seed an engine can feed its own decision-heuristic RNG.
    pub seed: u64,
    /// A coin an engine can use to bias initial variable polarity.
    pub polarity_bias: bool,
    /// A restart-interval hint (conflicts between restarts), diversified per engine.
    pub restart_interval: u32,
}

/// Derives one [Diversification] per `(rank, id)` pair. Two calls with the
/// same arguments always agree; distinct `id`s on the same rank diverge.
pub fn diversify(rank: u32, id: u32) -> Diversification {
    let mixed = ((rank as u64) << 32) ^ (id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = StdRng::seed_from_u64(mixed);
    Diversification {
        seed: rng.gen(),
        polarity_bias: rng.gen(),
        restart_interval: rng.gen_range(50..500),
    }
}

/// A family of engines a [WorkingStrategy] spawns to solve one formula.
pub trait WorkingStrategy: Send + Sync {
    /// Loads `clauses` into every engine, runs them to completion or
    /// interruption, and returns the winning result. Blocks until done.
    fn run(&self, clauses: &[Vec<i32>], var_count: usize, termination: std::sync::Arc<Termination>) -> Solve;
}

/// Which [SolverType] and size an engine group should be, by PRS convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineGroup {
    Sat,
    Unsat,
    Maple,
    Lgl,
    Default,
}

impl EngineGroup {
    pub fn preferred_solver_type(&self) -> SolverType {
        match self {
            EngineGroup::Sat | EngineGroup::Maple => SolverType::Cdcl,
            EngineGroup::Unsat | EngineGroup::Lgl | EngineGroup::Default => SolverType::Cdcl,
        }
    }
}

/// Partitions a world of `world_size` ranks into PRS's five groups: `{SAT:
/// W/8, UNSAT: W/4, MAPLE: W/8, LGL: 1, DEFAULT: rest}`, mirroring
/// `PortfolioPRS::computeNodeGroup`'s split over `mpi_world_size` rather than
/// any per-rank engine count. Degenerates gracefully for small `world_size`:
/// every group below 1 rank is dropped, and `DEFAULT` absorbs whatever the
/// fixed-size groups didn't claim (including, for `world_size == 1`, the
/// entire run).
pub fn partition_groups(world_size: usize) -> Vec<(EngineGroup, usize)> {
    if world_size == 0 {
        return Vec::new();
    }
    let sat = world_size / 8;
    let unsat = world_size / 4;
    let maple = world_size / 8;
    let lgl = if world_size > 1 { 1 } else { 0 };
    let fixed = sat + unsat + maple + lgl;
    let default = world_size.saturating_sub(fixed);

    let mut groups = Vec::new();
    for (group, count) in [
        (EngineGroup::Sat, sat),
        (EngineGroup::Unsat, unsat),
        (EngineGroup::Maple, maple),
        (EngineGroup::Lgl, lgl),
        (EngineGroup::Default, default),
    ] {
        if count > 0 {
            groups.push((group, count));
        }
    }
    groups
}

/// Which single [EngineGroup] rank `rank` falls into under [partition_groups]
/// applied to `world_size`, plus that group's contiguous rank range as
/// `(base, size)`. Every local engine on a rank shares the one group its rank
/// was assigned — PRS partitions ranks, not a rank's local engine count — and
/// `(base, size)` is what a [Ring](crate::global::ring::Ring) needs to keep
/// its neighbour topology confined to the rank's own group rather than
/// wrapping across the whole world.
pub fn rank_group(world_size: usize, rank: u32) -> (EngineGroup, u32, u32) {
    let mut base = 0u32;
    for (group, count) in partition_groups(world_size) {
        let count = count as u32;
        if rank < base + count {
            return (group, base, count);
        }
        base += count;
    }
    (EngineGroup::Default, 0, world_size.max(1) as u32)
}

/// The PRS run lifecycle, modelled explicitly rather than as nested booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrsPhase {
    /// Formula loaded, groups partitioned, not yet distributed.
    Preprocessing,
    /// Initial clause set broadcast to every rank (no-op under a
    /// single-rank [LoopbackTransport](crate::global::transport::LoopbackTransport)).
    Broadcasting,
    /// Engines running, sharer threads ticking, racing to [Termination].
    Running,
    /// A result has been published; engines are being interrupted and joined.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diversify_is_deterministic_per_rank_and_id() {
        assert_eq!(diversify(0, 3), diversify(0, 3));
        assert_ne!(diversify(0, 3), diversify(0, 4));
        assert_ne!(diversify(0, 3), diversify(1, 3));
    }

    #[test]
    fn restart_interval_stays_in_range() {
        for id in 0..32 {
            let d = diversify(2, id);
            assert!((50..500).contains(&d.restart_interval));
        }
    }

    #[test]
    fn world_partitions_into_the_expected_group_sizes() {
        let world_size = 16;
        let mut counts = std::collections::HashMap::new();
        for rank in 0..world_size as u32 {
            let (group, _base, _size) = rank_group(world_size, rank);
            *counts.entry(group).or_insert(0u32) += 1;
        }
        assert_eq!(counts[&EngineGroup::Sat], 2);
        assert_eq!(counts[&EngineGroup::Unsat], 4);
        assert_eq!(counts[&EngineGroup::Maple], 2);
        assert_eq!(counts[&EngineGroup::Lgl], 1);
        assert_eq!(counts[&EngineGroup::Default], 7);
    }

    #[test]
    fn rank_group_bounds_are_contiguous_and_cover_the_world() {
        let world_size = 16;
        for rank in 0..world_size as u32 {
            let (_group, base, size) = rank_group(world_size, rank);
            assert!(rank >= base && rank < base + size);
        }
    }

    #[test]
    fn single_rank_world_is_one_default_group() {
        let (group, base, size) = rank_group(1, 0);
        assert_eq!(group, EngineGroup::Default);
        assert_eq!(base, 0);
        assert_eq!(size, 1);
    }
}
