//! Stats: periodic counters, sent once per sharer tick.

/// Per-tick counts for one local sharing strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tick {
    pub exported_literals: usize,
    pub filtered_clauses: usize,
    pub imported_clauses: usize,
}

#[derive(Clone, Debug)]
pub enum Stat {
    /// Sent by a [LocalSharingStrategy](crate::local::LocalSharingStrategy)
    /// after completing one tick.
    LocalTick(Tick),
    /// Sent by a [GlobalSharingStrategy](crate::global::GlobalSharingStrategy)
    /// after completing one exchange.
    GlobalExchange { rank: u32, bytes_sent: usize, bytes_received: usize },
}
