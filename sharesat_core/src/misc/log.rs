//! Miscellaneous items related to [logging](log).
//!
//! Calls to the log macro are made throughout the fabric, at the
//! give/select/publish/terminate points where it's useful to see what the
//! sharing machinery is doing without instrumenting every call site by hand.
//!
//! Note, no log implementation is provided. For more details, see [log].

/// Targets to be used within a [log] macro.
pub mod targets {
    pub const BUFFER: &str = "buffer";
    pub const DATABASE: &str = "database";
    pub const LOCAL: &str = "local";
    pub const GLOBAL: &str = "global";
    pub const SHARER: &str = "sharer";
    pub const TERMINATION: &str = "termination";
    pub const TRANSPORT: &str = "transport";
}
