//! Local (single-node) sharing strategies: periodic gather from producers,
//! select under a budget, deliver to consumers.

pub mod horde;
pub mod simple;

use std::sync::Arc;
use std::time::Duration;

use crate::buffer::ClauseBuffer;
use crate::sharing::SharingEntity;

/// One producer's admission queue, plus the hook used to push an adapted LBD
/// threshold back to the engine that owns it.
pub struct LocalProducer {
    pub id: u32,
    pub buffer: Arc<ClauseBuffer>,
    pub set_lbd_limit: Box<dyn Fn(f64) + Send + Sync>,
}

impl LocalProducer {
    pub fn new(id: u32, buffer: Arc<ClauseBuffer>, set_lbd_limit: Box<dyn Fn(f64) + Send + Sync>) -> Self {
        LocalProducer {
            id,
            buffer,
            set_lbd_limit,
        }
    }
}

/// A strategy that periodically moves clauses from local producers to local
/// consumers. Driven by a [Sharer](crate::sharer::Sharer) on `period()`.
pub trait LocalSharingStrategy: Send + Sync {
    /// Performs one gather -> select -> deliver (-> adapt) cycle.
    fn do_sharing(&self);

    /// How often a driving [Sharer](crate::sharer::Sharer) should call `do_sharing`.
    fn period(&self) -> Duration;

    /// Registers an additional consumer of this strategy's selections.
    fn add_consumer(&self, consumer: Arc<dyn SharingEntity>);
}
