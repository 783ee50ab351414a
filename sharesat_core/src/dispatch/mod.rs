//! Dispatches for external observers.
//!
//! Any structure that can usefully report on its own activity optionally
//! holds a `crossbeam::channel::Sender<Dispatch>` and sends one of these on
//! state changes. Nothing in the fabric requires a receiver to be attached;
//! a dropped receiver just means sends silently fail, which producers ignore.

pub mod delta;
pub mod report;
pub mod stat;

/// One observable event.
#[derive(Clone, Debug)]
pub enum Dispatch {
    Delta(delta::Delta),
    Report(report::Report),
    Stat(stat::Stat),
}
