use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use super::ManualClock;
use crate::{Clock, ScheduledTask, Scheduler, TimerHandle};

struct Timer {
    due: DateTime<FixedOffset>,
    every: Option<Duration>,
    task: Option<ScheduledTask>,
}

#[derive(Default)]
struct Timers {
    next_id: u64,
    entries: BTreeMap<TimerHandle, Timer>,
}

/// A [`Scheduler`] driven by [`ManualClock`].
///
/// Nothing fires until [`ManualScheduler::advance`] is awaited. Due timers
/// then run in deadline order, with the clock set to each deadline before
/// its task runs.
#[derive(Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    timers: Arc<Mutex<Timers>>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.clock.now())
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl ManualScheduler {
    /// Schedule against `clock`.
    #[must_use]
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            timers: Arc::new(Mutex::new(Timers::default())),
        }
    }

    /// The clock this scheduler advances.
    #[must_use]
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    /// Timers that have neither fired (one-shot) nor been cancelled.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Move virtual time forward by `delta`, running every timer that falls
    /// due on the way.
    pub async fn advance(&self, delta: Duration) {
        let target = super::add_std(self.clock.now(), delta);
        while let Some((handle, due, mut task)) = self.take_next_due(target) {
            self.clock.set(due);
            task().await;
            self.finish(handle, task);
        }
        self.clock.set(target);
    }

    fn take_next_due(
        &self,
        target: DateTime<FixedOffset>,
    ) -> Option<(TimerHandle, DateTime<FixedOffset>, ScheduledTask)> {
        let mut timers = self.lock();
        let (handle, due) = timers
            .entries
            .iter()
            .filter(|(_, timer)| timer.task.is_some() && timer.due <= target)
            .min_by_key(|(handle, timer)| (timer.due, **handle))
            .map(|(handle, timer)| (*handle, timer.due))?;
        let timer = timers.entries.get_mut(&handle)?;
        let task = timer.task.take()?;
        if timer.every.is_none() {
            timers.entries.remove(&handle);
        }
        Some((handle, due, task))
    }

    fn finish(&self, handle: TimerHandle, task: ScheduledTask) {
        let mut timers = self.lock();
        // Absent when the task cancelled its own timer.
        if let Some(timer) = timers.entries.get_mut(&handle)
            && let Some(every) = timer.every
        {
            timer.due = super::add_std(timer.due, every.max(Duration::from_millis(1)));
            timer.task = Some(task);
        }
    }

    fn insert(&self, delay: Duration, every: Option<Duration>, task: ScheduledTask) -> TimerHandle {
        let due = super::add_std(self.clock.now(), delay);
        let mut timers = self.lock();
        let handle = TimerHandle::new(timers.next_id);
        timers.next_id += 1;
        timers.entries.insert(
            handle,
            Timer {
                due,
                every,
                task: Some(task),
            },
        );
        handle
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new(ManualClock::default())
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        self.insert(delay, None, task)
    }

    fn schedule_repeating(&self, interval: Duration, task: ScheduledTask) -> TimerHandle {
        self.insert(interval, Some(interval), task)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.lock().entries.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>) -> ScheduledTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test]
    async fn fires_only_when_time_reaches_deadline() {
        let scheduler = ManualScheduler::default();
        let calls = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_once(Duration::from_secs(1), counting_task(&calls));

        scheduler.advance(Duration::from_millis(999)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        scheduler.advance(Duration::from_millis(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn repeating_timer_catches_up_in_one_advance() {
        let scheduler = ManualScheduler::default();
        let calls = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_repeating(Duration::from_secs(10), counting_task(&calls));

        scheduler.advance(Duration::from_secs(35)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[tokio::test]
    async fn cancelled_timer_is_dropped() {
        let scheduler = ManualScheduler::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule_once(Duration::from_secs(1), counting_task(&calls));
        scheduler.cancel(handle);

        scheduler.advance(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clock_reads_deadline_while_task_runs() {
        let scheduler = ManualScheduler::default();
        let clock = scheduler.clock();
        let start = clock.now();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let reader = clock.clone();
        scheduler.schedule_once(
            Duration::from_secs(2),
            Box::new(move || {
                let sink = Arc::clone(&sink);
                let reader = reader.clone();
                Box::pin(async move {
                    *sink.lock().expect("lock") = Some(reader.now());
                })
            }),
        );

        scheduler.advance(Duration::from_secs(10)).await;
        let fired_at = seen.lock().expect("lock").expect("task ran");
        assert_eq!((fired_at - start).num_seconds(), 2);
        assert_eq!((clock.now() - start).num_seconds(), 10);
    }
}
