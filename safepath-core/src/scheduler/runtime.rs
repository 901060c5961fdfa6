//! [`Scheduler`] backed by the Tokio timer wheel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval_at, sleep};

use super::{ScheduledTask, Scheduler, TimerHandle};

/// Spawns one Tokio task per timer; cancelling aborts the task.
///
/// Tasks are spawned on the runtime whose [`Handle`] was supplied at
/// construction, so the scheduler may be used from outside that runtime.
pub struct TokioScheduler {
    handle: Handle,
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<TimerHandle, JoinHandle<()>>>>,
}

impl std::fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl TokioScheduler {
    /// Schedule onto the runtime behind `handle`.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Schedule onto the runtime the caller is running in, if any.
    #[must_use]
    pub fn from_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Number of timers that have not yet finished or been cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|_, task| !task.is_finished());
        tasks.len()
    }

    fn register(&self, task: JoinHandle<()>, id: TimerHandle) {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, task);
    }

    fn next_handle(&self) -> TimerHandle {
        TimerHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration, mut task: ScheduledTask) -> TimerHandle {
        let id = self.next_handle();
        let tasks = Arc::clone(&self.tasks);
        let join = self.handle.spawn(async move {
            sleep(delay).await;
            task().await;
            tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
        });
        self.register(join, id);
        id
    }

    fn schedule_repeating(&self, period: Duration, mut task: ScheduledTask) -> TimerHandle {
        let id = self.next_handle();
        let period = period.max(Duration::from_millis(1));
        let join = self.handle.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                task().await;
            }
        });
        self.register(join, id);
        id
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle)
        {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_task(counter: &Arc<AtomicUsize>) -> ScheduledTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn once_fires_after_delay() {
        let scheduler = TokioScheduler::from_current().expect("inside a runtime");
        let calls = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_once(Duration::from_secs(1), counting_task(&calls));

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let scheduler = TokioScheduler::from_current().expect("inside a runtime");
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule_once(Duration::from_secs(1), counting_task(&calls));
        scheduler.cancel(handle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_timer_ticks_each_interval() {
        let scheduler = TokioScheduler::from_current().expect("inside a runtime");
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule_repeating(Duration::from_secs(10), counting_task(&calls));

        tokio::time::sleep(Duration::from_secs(35)).await;
        tokio::task::yield_now().await;
        scheduler.cancel(handle);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
