//! Cancellable periodic task, independent of any particular runtime.
//!
//! The transmit schedule is a single self-rearming timer: each cycle arms
//! the next trigger *before* running the tick body, so a cancellation
//! landing mid-tick never loses ticks it does not own. One timer, one
//! consumer - overlapping ticks cannot happen by construction.

use cpm_env::V2xContext;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Handle to a spawned periodic task.
///
/// Dropping the handle cancels the task.
pub struct PeriodicTask {
    interval: Arc<Mutex<Duration>>,
    cancelled: Arc<AtomicBool>,
}

impl PeriodicTask {
    /// Spawns a periodic task on the given context.
    ///
    /// The callback runs to completion on every tick; the next interval is
    /// read fresh each cycle.
    pub fn spawn<C, F, Fut>(ctx: Arc<C>, name: &str, interval: Duration, tick: F) -> Self
    where
        C: V2xContext,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let interval = Arc::new(Mutex::new(interval));
        let cancelled = Arc::new(AtomicBool::new(false));

        let task_interval = interval.clone();
        let task_cancelled = cancelled.clone();
        let task_ctx = ctx.clone();

        ctx.spawn(name, async move {
            loop {
                let next = *task_interval.lock().unwrap();
                task_ctx.sleep(next).await;
                if task_cancelled.load(Ordering::Acquire) {
                    break;
                }
                tick().await;
            }
        });

        Self {
            interval,
            cancelled,
        }
    }

    /// Changes the period.
    ///
    /// Takes effect when the next trigger is armed, not retroactively: a
    /// sleep already in flight completes at the old interval first.
    pub fn set_interval(&self, interval: Duration) {
        *self.interval.lock().unwrap() = interval;
    }

    /// Current period.
    pub fn interval(&self) -> Duration {
        *self.interval.lock().unwrap()
    }

    /// Stops the task before its next tick fires.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// True once the task has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
