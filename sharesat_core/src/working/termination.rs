//! The termination bus: one object, passed by reference, that every working
//! strategy and every solver thread consults to learn "are we done yet" and
//! uses to announce "I am done" — monotonic, first writer wins.

use std::sync::{Arc, Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::dispatch::report::Solve;
use crate::misc::log::targets;

struct TerminationState {
    result: Option<Solve>,
    model: Option<Vec<i32>>,
    winner_rank: Option<u32>,
}

/// Shared via `Arc<Termination>`. The `AtomicBool` gives every hot-path
/// `should_stop()` check a lock-free fast path; the `Mutex`+`Condvar` pair
/// behind it exists only for the (rare) publish and the (also rare) blocking
/// wait for a result.
pub struct Termination {
    ending: AtomicBool,
    state: Mutex<TerminationState>,
    condvar: Condvar,
}

impl Default for Termination {
    fn default() -> Self {
        Termination {
            ending: AtomicBool::new(false),
            state: Mutex::new(TerminationState {
                result: None,
                model: None,
                winner_rank: None,
            }),
            condvar: Condvar::new(),
        }
    }
}

impl Termination {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Lock-free check; safe to call from a solver's inner loop.
    pub fn should_stop(&self) -> bool {
        self.ending.load(Ordering::Acquire)
    }

    /// Publishes `result` as the final outcome, if none has been published
    /// yet. Returns `true` if this call was the one that won (first writer
    /// wins; later calls are no-ops). Wakes every thread blocked in [wait].
    pub fn publish(&self, result: Solve, model: Option<Vec<i32>>, winner_rank: u32) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.result.is_some() {
            log::trace!(target: targets::TERMINATION, "Rank {winner_rank} lost the publish race");
            return false;
        }
        state.result = Some(result);
        state.model = model;
        state.winner_rank = Some(winner_rank);
        self.ending.store(true, Ordering::Release);
        self.condvar.notify_all();
        log::debug!(target: targets::TERMINATION, "Rank {winner_rank} published {result:?}");
        true
    }

    /// Blocks until a result has been published, or until `deadline` passes
    /// if given — used by a run's timeout watchdog.
    pub fn wait(&self, deadline: Option<std::time::Duration>) -> Option<(Solve, Option<Vec<i32>>, u32)> {
        let state = self.state.lock().unwrap();
        let state = match deadline {
            Some(d) => {
                let (state, _timed_out) = self
                    .condvar
                    .wait_timeout_while(state, d, |s| s.result.is_none())
                    .unwrap();
                state
            }
            None => self.condvar.wait_while(state, |s| s.result.is_none()).unwrap(),
        };
        state
            .result
            .map(|result| (result, state.model.clone(), state.winner_rank.unwrap()))
    }

    /// The published result, if any, without blocking.
    pub fn result(&self) -> Option<(Solve, Option<Vec<i32>>, u32)> {
        let state = self.state.lock().unwrap();
        state
            .result
            .map(|result| (result, state.model.clone(), state.winner_rank.unwrap()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn first_publish_wins() {
        let termination = Termination::new();
        assert!(termination.publish(Solve::Satisfiable, Some(vec![1, -2]), 0));
        assert!(!termination.publish(Solve::Unsatisfiable, None, 1));
        let (result, model, winner) = termination.result().unwrap();
        assert_eq!(result, Solve::Satisfiable);
        assert_eq!(model, Some(vec![1, -2]));
        assert_eq!(winner, 0);
    }

    #[test]
    fn should_stop_flips_on_publish() {
        let termination = Termination::new();
        assert!(!termination.should_stop());
        termination.publish(Solve::Unknown, None, 0);
        assert!(termination.should_stop());
    }

    #[test]
    fn wait_unblocks_when_another_thread_publishes() {
        let termination = Termination::new();
        let publisher = Arc::clone(&termination);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            publisher.publish(Solve::Satisfiable, None, 2);
        });
        let (result, _model, winner) = termination.wait(None).unwrap();
        assert_eq!(result, Solve::Satisfiable);
        assert_eq!(winner, 2);
        handle.join().unwrap();
    }

    #[test]
    fn wait_with_deadline_times_out_without_a_result() {
        let termination = Termination::new();
        assert!(termination.wait(Some(Duration::from_millis(5))).is_none());
    }
}
