//! [SharingEntity]: anything that produces and/or consumes clauses.
//!
//! Both solvers and strategies forwarded-as-peers implement this, which is
//! what lets a [LocalSharingStrategy](crate::local::LocalSharingStrategy) sit
//! downstream of a [GlobalSharingStrategy](crate::global::GlobalSharingStrategy)
//! (or vice versa) without the two layers knowing about each other's concrete
//! type.

use crate::clause::ClauseExchange;

/// The capability a solver or strategy exposes to participate in sharing.
pub trait SharingEntity: Send + Sync {
    /// Registers `client` as a recipient of this entity's `import_clauses` calls.
    fn add_client(&self, client: std::sync::Arc<dyn SharingEntity>);

    /// Registers `producer` as a source this entity should gather from.
    fn add_producer(&self, producer: std::sync::Arc<dyn SharingEntity>);

    /// Wires `producer`'s `export_clause` callback to flow into this entity.
    fn connect_producer(&self, producer: std::sync::Arc<dyn SharingEntity>) {
        self.add_producer(producer);
    }

    /// Delivers clauses this entity did not itself produce.
    fn import_clauses(&self, clauses: &[ClauseExchange]);

    /// A stable identifier for this entity, used as a clause's `from` field
    /// and for per-producer LBD-limit bookkeeping.
    fn entity_id(&self) -> u32;
}
