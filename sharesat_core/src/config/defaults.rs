//! Default values for every [super::Config] field.

pub const CPUS: usize = 1;

pub const MAX_CLAUSE_SIZE: usize = 64;

pub const SHARED_LITERALS_PER_PRODUCER: usize = 1500;

pub const HORDE_INITIAL_LBD_LIMIT: f64 = 2.0;

pub const HORDE_INIT_ROUND: u32 = 1;

pub const SIMPLE_SHARE_LIMIT: usize = 1500;

pub const GLOBAL_SHARED_LITERALS: usize = 50_000;

pub const MALLOB_MAX_BUFFER_SIZE: usize = 1_000;

pub const MALLOB_LBD_LIMIT: u32 = 8;

pub const MALLOB_SIZE_LIMIT: usize = 40;

pub const MALLOB_SHARINGS_PER_SECOND: f64 = 1.0;

pub const MALLOB_MAX_COMPENSATION: f64 = 4.0;

pub const MALLOB_RESHARE_PERIOD: f64 = 1.0;

/// Fraction tolerance around a sharing rate target before `lbdLimit` adapts.
pub const ADAPTATION_EPSILON: f64 = 0.1;

/// Multiplicative step applied to `lbdLimit` when adapting up or down.
pub const ADAPTATION_STEP: f64 = 0.1;
