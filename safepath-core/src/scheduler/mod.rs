//! Schedulable timers.
//!
//! Debounce and periodic-refresh timers are requested through the
//! [`Scheduler`] trait so services never sleep on the wall clock directly.
//! Production code uses [`TokioScheduler`]; tests use
//! `test_support::ManualScheduler` and advance virtual time.

mod runtime;

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;

pub use runtime::TokioScheduler;

/// Identifies a scheduled timer so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Work run when a timer fires. Repeating timers call it once per tick.
pub type ScheduledTask = Box<dyn FnMut() -> BoxFuture<'static, ()> + Send + 'static>;

/// Runs tasks after a delay or on a fixed interval.
pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay`.
    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> TimerHandle;

    /// Run `task` every `interval`, first after one full interval.
    fn schedule_repeating(&self, interval: Duration, task: ScheduledTask) -> TimerHandle;

    /// Cancel a timer. Unknown or already-fired handles are ignored.
    fn cancel(&self, handle: TimerHandle);
}

impl<T> Scheduler for Arc<T>
where
    T: Scheduler + ?Sized,
{
    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        (**self).schedule_once(delay, task)
    }

    fn schedule_repeating(&self, interval: Duration, task: ScheduledTask) -> TimerHandle {
        (**self).schedule_repeating(interval, task)
    }

    fn cancel(&self, handle: TimerHandle) {
        (**self).cancel(handle);
    }
}
