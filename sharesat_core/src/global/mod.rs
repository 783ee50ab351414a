//! Cross-rank sharing strategies and the transport they run over.
//!
//! `sharesat_core` never assumes a particular cluster scheduler or messaging
//! library. Every global strategy is built against the [Transport] trait, so
//! a single process can stub an in-memory `allgather` for tests (see
//! [transport::ChannelTransport]) while a real deployment supplies a
//! transport backed by whatever message-passing layer the cluster provides.

pub mod all_gather;
pub mod mallob;
pub mod ring;
pub mod transport;

use std::time::Duration;

use crate::error;

/// Point-to-point send/recv with rank addressing, plus the two collectives a
/// global strategy needs.
///
/// Must support at least `SERIALIZED` threading (one thread at a time enters
/// the library). If the underlying layer cannot guarantee this, [init]
/// should return `Err(error::Transport::InsufficientThreading)` and the
/// caller demotes to local-only sharing.
pub trait Transport: Send + Sync {
    /// This process's rank.
    fn rank(&self) -> u32;

    /// Total number of ranks in the run.
    fn world_size(&self) -> u32;

    /// Allocates send/receive buffers and establishes topology. Called once
    /// before any other method; a strategy whose `init` fails is excluded
    /// from the active set for the run.
    fn init(&self) -> Result<(), error::Transport>;

    /// Blocking point-to-point send to `to`.
    fn send(&self, to: u32, payload: Vec<u8>) -> Result<(), error::Transport>;

    /// Blocking point-to-point receive from `from`.
    fn recv(&self, from: u32) -> Result<Vec<u8>, error::Transport>;

    /// Non-blocking point-to-point receive from `from`.
    fn try_recv(&self, from: u32) -> Option<Vec<u8>>;

    /// Broadcasts `payload` (required on `root`, ignored elsewhere) from
    /// `root` to every rank, returning the broadcast payload.
    fn broadcast(&self, root: u32, payload: Option<Vec<u8>>) -> Result<Vec<u8>, error::Transport>;

    /// Every rank contributes `payload`; every rank receives every
    /// contribution, indexed by rank.
    fn allgather(&self, payload: Vec<u8>) -> Result<Vec<Vec<u8>>, error::Transport>;
}

/// A strategy that exchanges clauses between ranks using a [Transport].
pub trait GlobalSharingStrategy: Send + Sync {
    /// Allocates transport-side resources. Returning `false` excludes this
    /// strategy from the active set for the run (see spec §4.7).
    fn init_transport(&self) -> bool;

    /// Performs one global exchange step.
    fn do_sharing(&self);

    /// How often a driving [Sharer](crate::sharer::Sharer) should call `do_sharing`.
    fn period(&self) -> Duration;
}
