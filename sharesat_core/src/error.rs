//! Error enums, namespaced by the module they relate to.
//!
//! Intended use is `use error::{self}`, then `error::Config`, `error::Transport`, etc.
//! Nothing in this crate bundles these behind a `dyn Error` — callers match on the
//! concrete variant, since every failure here is a fixed, small, known set.

/// Startup configuration errors. Fatal: the caller should abort the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Config {
    /// An unrecognised portfolio strategy letter/number was requested.
    UnknownStrategy,
    /// A PRS group could not be formed for the requested world size.
    InvalidGroupPartition,
    /// The requested clause-size budget is zero or otherwise unusable.
    InvalidClauseSizeBound,
}

/// Transport / messaging-layer errors. Non-fatal: the offending strategy is removed
/// from the active set and the run continues with whatever remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// The transport could not provide the threading level a strategy requires.
    InsufficientThreading,
    /// A send or receive failed because the peer rank is gone.
    PeerUnreachable,
    /// A payload did not decode as a valid clause wire format.
    MalformedPayload,
}

/// Wire codec errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    /// The byte stream ended before a complete varint could be read.
    Truncated,
    /// A clause header declared a size that does not fit the remaining bytes.
    SizeMismatch,
}
