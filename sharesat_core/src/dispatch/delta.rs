//! Deltas: notice of some change to a buffer, database, or strategy.

/// Changes to a [ClauseBuffer](crate::buffer::ClauseBuffer) or
/// [ClauseDatabase](crate::db::ClauseDatabase).
#[derive(Clone, Debug)]
pub enum Database {
    /// A clause of `size` literals was accepted.
    Accepted { size: usize },
    /// A clause of `size` literals was rejected (oversized, over-LBD, or a
    /// duplicate — the reason is not distinguished here; see [super::stat::Stat]
    /// for counted breakdowns).
    Rejected { size: usize },
    /// A new producer shard was created (`BufferPerEntity` only).
    ShardCreated { producer: u32 },
}

/// Changes to a sharing strategy's adaptation state.
#[derive(Clone, Debug)]
pub enum Strategy {
    /// A producer's `lbdLimit` was adjusted.
    LbdLimitAdapted { producer: u32, new_limit: f64 },
}

#[derive(Clone, Debug)]
pub enum Delta {
    Database(Database),
    Strategy(Strategy),
}
