//! [SolverInterface]: the capability set consumed from external CDCL /
//! local-search engines.
//!
//! The engines themselves (Kissat, MapleCOMSPS, Lingeling, a local-search
//! engine, ...) are black boxes. Everything the fabric needs from one is this
//! trait; nothing here assumes a particular internal algorithm.

use std::sync::Arc;

/// Outcome of one `solve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

/// A family of engine, used for portfolio diversification and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverType {
    Cdcl,
    LocalSearch,
}

/// Callback invoked by an engine whenever it learns a clause.
pub type ExportCallback = Box<dyn Fn(Vec<i32>, u32) + Send + Sync>;

/// The capability set the sharing fabric requires from a solver engine.
///
/// Every method takes `&self`: a running `solve` must remain reachable for
/// clause import and interruption (§6: `addClause`/`addClauses` are
/// "MT-safe"; §5's cancellation path requires `setInterrupt` to reach a
/// solver while its `solve` is in progress). Implementations hold their
/// mutable search state behind their own interior mutability (an internal
/// lock, or atomics for the hot paths) rather than exposing it through the
/// trait. The fabric still guarantees at most one in-flight `solve` per
/// instance — engines never need to defend against concurrent re-entry into
/// `solve` itself, only against `add_clause`/`set_interrupt` arriving while
/// one is running.
pub trait SolverInterface: Send + Sync {
    /// One-shot, synchronous formula load. Called once, before `solve`.
    fn load_formula(&self, clauses: &[Vec<i32>], var_count: usize);

    /// Blocking solve, optionally under the given assumption cube.
    fn solve(&self, cube: &[i32]) -> SolveResult;

    /// Imports one learned clause. Safe to call concurrently with a running
    /// `solve` on the same instance, and with other `add_clause` calls.
    fn add_clause(&self, clause: &[i32]);

    /// Imports several learned clauses in one call.
    fn add_clauses(&self, clauses: &[Vec<i32>]) {
        for clause in clauses {
            self.add_clause(clause);
        }
    }

    /// Registers the callback the engine should invoke when it learns a clause.
    fn set_export_callback(&self, callback: ExportCallback);

    /// Adjusts the engine's own export threshold (only clauses at or below
    /// this LBD are exported going forward). Safe to call while `solve` runs.
    fn set_lbd_limit(&self, limit: f64);

    /// Requests that an in-progress `solve` return as soon as possible.
    fn set_interrupt(&self);

    /// Clears a previously set interrupt request.
    fn unset_interrupt(&self);

    /// The satisfying assignment, valid only after `solve` returned `Satisfiable`.
    fn get_model(&self) -> Option<Vec<i32>>;

    /// A unique id for this engine instance within its rank.
    fn get_solver_id(&self) -> u32;

    /// A stable identifier for this engine's concrete implementation.
    fn get_solver_type_id(&self) -> u32;

    /// The family this engine belongs to.
    fn get_solver_type(&self) -> SolverType;
}

/// Convenience alias for the trait-object form most of the fabric stores. No
/// outer lock: implementations are internally thread-safe (see
/// [SolverInterface]'s `&self` methods), so a shared handle can have `solve`
/// running on one thread while another calls `add_clause`/`set_interrupt`.
pub type SharedSolver = Arc<dyn SolverInterface>;
