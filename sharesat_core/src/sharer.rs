//! [Sharer]: the dedicated thread(s) that drive sharing strategies on a tick.
//!
//! A strategy only knows how to do one `do_sharing()` step; something has to
//! call it on a schedule. `Sharer` is that something: either one thread per
//! strategy (the default) or a single round-robin thread across every
//! strategy (`Config::one_sharer`), matching the choice `otter_cli::listener`
//! makes between a dedicated dispatch thread and folding work into the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::global::GlobalSharingStrategy;
use crate::local::LocalSharingStrategy;
use crate::misc::log::targets;

/// A strategy this module can drive, regardless of whether it shares locally
/// or across ranks.
pub enum SharerTask {
    Local(Arc<dyn LocalSharingStrategy>),
    Global(Arc<dyn GlobalSharingStrategy>),
}

impl SharerTask {
    fn do_sharing(&self) {
        match self {
            SharerTask::Local(s) => s.do_sharing(),
            SharerTask::Global(s) => s.do_sharing(),
        }
    }

    fn period(&self) -> Duration {
        match self {
            SharerTask::Local(s) => s.period(),
            SharerTask::Global(s) => s.period(),
        }
    }
}

/// Owns the running sharer thread(s) and the flag that tells them to stop.
///
/// Dropping a `Sharer` does not stop its threads; call [Sharer::stop] and
/// then [Sharer::join] (or just `join`, which stops first) to shut down
/// cleanly. A stopping sharer always performs one final `do_sharing()` call
/// per task before its thread exits, so work queued just before shutdown is
/// not silently dropped.
pub struct Sharer {
    running: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl Sharer {
    /// Spawns threads driving `tasks`. If `one_sharer` is set, every task is
    /// driven round-robin from a single thread, waking at the shortest
    /// period among them; otherwise each task gets its own thread sleeping
    /// on its own period.
    pub fn spawn(tasks: Vec<SharerTask>, one_sharer: bool) -> Self {
        log::debug!(target: targets::SHARER, "Spawning {} task(s), one_sharer={one_sharer}", tasks.len());
        let running = Arc::new(AtomicBool::new(true));
        let handles = if one_sharer {
            vec![Self::spawn_round_robin(tasks, Arc::clone(&running))]
        } else {
            tasks
                .into_iter()
                .map(|task| Self::spawn_single(task, Arc::clone(&running)))
                .collect()
        };
        Sharer { running, handles }
    }

    fn spawn_single(task: SharerTask, running: Arc<AtomicBool>) -> JoinHandle<()> {
        thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                thread::sleep(task.period());
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                task.do_sharing();
            }
            task.do_sharing();
        })
    }

    fn spawn_round_robin(tasks: Vec<SharerTask>, running: Arc<AtomicBool>) -> JoinHandle<()> {
        thread::spawn(move || {
            if tasks.is_empty() {
                return;
            }
            let tick = tasks.iter().map(SharerTask::period).min().unwrap_or(Duration::from_millis(50));
            while running.load(Ordering::Relaxed) {
                thread::sleep(tick);
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                for task in &tasks {
                    task.do_sharing();
                }
            }
            for task in &tasks {
                task.do_sharing();
            }
        })
    }

    /// Signals every driven thread to stop after its current tick.
    pub fn stop(&self) {
        log::debug!(target: targets::SHARER, "Stop requested");
        self.running.store(false, Ordering::Relaxed);
    }

    /// Stops and waits for every driven thread to exit.
    pub fn join(mut self) {
        self.stop();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for Sharer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::ClauseExchange;
    use crate::db::per_size::PerSize;
    use crate::db::ClauseDatabase;
    use crate::local::simple::Simple;
    use crate::sharing::SharingEntity;
    use std::sync::atomic::AtomicUsize;

    struct Sink(AtomicUsize);
    impl SharingEntity for Sink {
        fn add_client(&self, _c: Arc<dyn SharingEntity>) {}
        fn add_producer(&self, _p: Arc<dyn SharingEntity>) {}
        fn import_clauses(&self, clauses: &[ClauseExchange]) {
            self.0.fetch_add(clauses.len(), Ordering::SeqCst);
        }
        fn entity_id(&self) -> u32 {
            0
        }
    }

    #[test]
    fn stopping_a_sharer_still_flushes_pending_work() {
        let database: Arc<dyn ClauseDatabase> = Arc::new(PerSize::new(8));
        database.add_clause(ClauseExchange::new(vec![1, 2], 1, 0));
        let simple = Arc::new(Simple::new(Vec::new(), database, 100, Duration::from_secs(3600), None));
        let sink = Arc::new(Sink(AtomicUsize::new(0)));
        simple.add_consumer(sink.clone());

        let sharer = Sharer::spawn(vec![SharerTask::Local(simple)], false);
        // the sleep period is an hour; without the final flush on stop this
        // assertion would need to wait an hour to pass.
        sharer.join();
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }
}
