//! Fan-in barrier for one batch run
//!
//! Tracks how many fetches were dispatched and how many finished, plus
//! whether dispatching is over. The transition to transforming fires
//! exactly once, on whichever call first observes
//! `all_dispatched && completed == dispatched`.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

/// Snapshot of the barrier counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    pub dispatched: usize,
    pub completed: usize,
    pub all_dispatched: bool,
    pub fired: bool,
}

impl RunState {
    fn ready(&self) -> bool {
        self.all_dispatched && self.completed == self.dispatched
    }
}

/// Exactly-once completion barrier, owned by a single `run_batch` call
#[derive(Debug, Default)]
pub struct FanInBarrier {
    state: Mutex<RunState>,
    notify: Notify,
}

impl FanInBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more dispatched fetch
    pub fn register(&self) {
        let mut state = self.lock();
        debug_assert!(!state.all_dispatched, "register after seal");
        state.dispatched += 1;
    }

    /// Count one finished fetch. Returns true if this call fired the barrier.
    pub fn complete(&self) -> bool {
        let mut state = self.lock();
        debug_assert!(state.completed < state.dispatched);
        state.completed += 1;
        self.try_fire(&mut state)
    }

    /// Mark dispatching as finished. Returns true if this call fired the
    /// barrier, which happens when nothing is still in flight.
    pub fn seal(&self) -> bool {
        let mut state = self.lock();
        state.all_dispatched = true;
        self.try_fire(&mut state)
    }

    /// Current counters
    pub fn snapshot(&self) -> RunState {
        *self.lock()
    }

    /// Wait until the barrier has fired
    pub async fn wait(&self) {
        loop {
            if self.lock().fired {
                return;
            }
            self.notify.notified().await;
        }
    }

    fn try_fire(&self, state: &mut MutexGuard<'_, RunState>) -> bool {
        if state.fired || !state.ready() {
            return false;
        }
        state.fired = true;
        // notify_one stores a permit, so a waiter arriving late still wakes
        self.notify.notify_one();
        true
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        // Counters stay consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Completes one registered fetch when dropped, including on panic
#[derive(Debug)]
pub struct CompletionGuard {
    barrier: Arc<FanInBarrier>,
}

impl CompletionGuard {
    /// Register a fetch and return the guard that completes it
    pub fn register(barrier: Arc<FanInBarrier>) -> Self {
        barrier.register();
        Self { barrier }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.barrier.complete() {
            tracing::debug!("All fetches finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_seal_with_nothing_dispatched_fires() {
        let barrier = FanInBarrier::new();
        assert!(barrier.seal());
        assert!(barrier.snapshot().fired);
    }

    #[test]
    fn test_completion_before_seal_does_not_fire() {
        let barrier = FanInBarrier::new();
        barrier.register();
        barrier.register();
        assert!(!barrier.complete());
        assert!(!barrier.complete());
        // All fetches finished before dispatching ended; seal must fire
        assert!(barrier.seal());
    }

    #[test]
    fn test_last_completion_fires_once() {
        let barrier = FanInBarrier::new();
        barrier.register();
        barrier.register();
        assert!(!barrier.seal());
        assert!(!barrier.complete());
        assert!(barrier.complete());

        let state = barrier.snapshot();
        assert_eq!(state.dispatched, 2);
        assert_eq!(state.completed, 2);
    }

    #[test]
    fn test_guard_completes_on_drop() {
        let barrier = Arc::new(FanInBarrier::new());
        let guard = CompletionGuard::register(barrier.clone());
        assert_eq!(barrier.snapshot().dispatched, 1);
        drop(guard);
        assert_eq!(barrier.snapshot().completed, 1);
        assert!(barrier.seal());
    }

    #[tokio::test]
    async fn test_guard_completes_when_task_panics() {
        let barrier = Arc::new(FanInBarrier::new());
        let guard = CompletionGuard::register(barrier.clone());
        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("fetch task failed");
        });
        assert!(handle.await.is_err());

        barrier.seal();
        tokio::time::timeout(Duration::from_secs(1), barrier.wait())
            .await
            .expect("barrier should have fired");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_randomized_completions_fire_exactly_once() {
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            let fetches = rng.gen_range(0..40);
            let barrier = Arc::new(FanInBarrier::new());
            let fired = Arc::new(AtomicUsize::new(0));

            let mut delays: Vec<u64> = (0..fetches).map(|_| rng.gen_range(0..3)).collect();
            delays.shuffle(&mut rng);

            let mut handles = Vec::new();
            for delay in delays {
                barrier.register();
                let barrier = barrier.clone();
                let fired = fired.clone();
                handles.push(tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    if barrier.complete() {
                        fired.fetch_add(1, Ordering::SeqCst);
                    }
                }));
            }
            if barrier.seal() {
                fired.fetch_add(1, Ordering::SeqCst);
            }

            tokio::time::timeout(Duration::from_secs(5), barrier.wait())
                .await
                .expect("barrier should have fired");
            for handle in handles {
                handle.await.unwrap();
            }

            let state = barrier.snapshot();
            assert_eq!(fired.load(Ordering::SeqCst), 1);
            assert_eq!(state.completed, fetches);
            assert_eq!(state.dispatched, fetches);
        }
    }
}
