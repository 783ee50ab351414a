//! Tunables shared across the sharing fabric.
//!
//! Mirrors the CLI surface named in spec §6. The CLI crate is the only place
//! that parses command-line flags; this crate only defines what those flags
//! feed into.

pub mod defaults;

/// Which portfolio working strategy to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Portfolio {
    /// One rank, a fixed engine mix, a single local sharer.
    Simple,
    /// Preprocessing-aware, group-partitioned, ring-topology distributed strategy.
    Prs,
}

impl std::fmt::Display for Portfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Prs => write!(f, "prs"),
        }
    }
}

/// Which local sharing strategy a working strategy wires up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalStrategyKind {
    /// HordeSat-style: adapts each producer's LBD threshold toward a target rate.
    HordeSat,
    /// Fixed per-tick share limit, no adaptation.
    Simple,
}

/// Which global (cross-rank) sharing strategy a working strategy wires up,
/// if `enable_distributed` is set and the transport supports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalStrategyKind {
    AllGather,
    Ring,
    Mallob,
}

/// All tunables named in spec §6, plus the local/global strategy selection.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of solver threads/engines on this rank.
    pub cpus: usize,
    /// Overall run timeout, in seconds. `None` means no timeout.
    pub timeout: Option<u64>,
    /// Attempt to use a distributed (cross-rank) transport.
    pub enable_distributed: bool,
    /// Which global strategy to wire up when `enable_distributed` succeeds.
    pub global_strategy: GlobalStrategyKind,
    /// Which portfolio working strategy to run.
    pub portfolio: Portfolio,
    /// Use the `Simple` local strategy instead of `HordeSat`.
    pub simple: bool,
    /// Maximum literal count for any clause admitted anywhere in the fabric.
    pub max_clause_size: usize,
    /// HordeSat target literals/tick/producer.
    pub shared_literals_per_producer: usize,
    /// HordeSat initial LBD admission threshold.
    pub horde_initial_lbd_limit: f64,
    /// Number of ticks during which HordeSat admits everything, unadapted.
    pub horde_init_round: u32,
    /// Simple-variant fixed share limit (literals/tick).
    pub simple_share_limit: usize,
    /// Literal budget for one AllGather payload.
    pub global_shared_literals: usize,
    /// Mallob aggregation buffer size, in clauses.
    pub mallob_max_buffer_size: usize,
    /// Mallob ingress LBD filter.
    pub mallob_lbd_limit: u32,
    /// Mallob ingress size filter.
    pub mallob_size_limit: usize,
    /// Mallob target global sharing rate, in exchanges/second.
    pub mallob_sharings_per_second: f64,
    /// Mallob per-rank maximum compensation multiplier.
    pub mallob_max_compensation: f64,
    /// Mallob compensation accounting window, in seconds.
    pub mallob_reshare_period: f64,
    /// Drive every local/global strategy from a single round-robin sharer
    /// thread instead of one sharer thread per strategy.
    pub one_sharer: bool,
    /// Suppress model output on SAT.
    pub no_model: bool,
    /// Verbosity level for CLI/solver progress messages.
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cpus: defaults::CPUS,
            timeout: None,
            enable_distributed: false,
            global_strategy: GlobalStrategyKind::Ring,
            portfolio: Portfolio::Simple,
            simple: false,
            max_clause_size: defaults::MAX_CLAUSE_SIZE,
            shared_literals_per_producer: defaults::SHARED_LITERALS_PER_PRODUCER,
            horde_initial_lbd_limit: defaults::HORDE_INITIAL_LBD_LIMIT,
            horde_init_round: defaults::HORDE_INIT_ROUND,
            simple_share_limit: defaults::SIMPLE_SHARE_LIMIT,
            global_shared_literals: defaults::GLOBAL_SHARED_LITERALS,
            mallob_max_buffer_size: defaults::MALLOB_MAX_BUFFER_SIZE,
            mallob_lbd_limit: defaults::MALLOB_LBD_LIMIT,
            mallob_size_limit: defaults::MALLOB_SIZE_LIMIT,
            mallob_sharings_per_second: defaults::MALLOB_SHARINGS_PER_SECOND,
            mallob_max_compensation: defaults::MALLOB_MAX_COMPENSATION,
            mallob_reshare_period: defaults::MALLOB_RESHARE_PERIOD,
            one_sharer: false,
            no_model: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// The local strategy kind implied by `self.simple`.
    pub fn local_strategy_kind(&self) -> LocalStrategyKind {
        if self.simple {
            LocalStrategyKind::Simple
        } else {
            LocalStrategyKind::HordeSat
        }
    }

    /// Lower/upper bounds any producer's adapted LBD limit must stay within.
    pub fn lbd_limit_envelope(&self) -> (f64, f64) {
        (2.0, self.max_clause_size as f64)
    }
}
