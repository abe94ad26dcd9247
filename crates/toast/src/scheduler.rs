//! Time source and one-shot timers behind toast expiry.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use tokio::{runtime::Handle, task::AbortHandle, time::Instant};

/// Callback run once when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Millisecond time source.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// One-shot timer facility.
///
/// A task fires at most once. Cancelling through the returned handle before
/// the deadline guarantees the task never runs.
pub trait Scheduler: Clock {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Cancellation handle for a scheduled task.
///
/// Dropping the handle does not cancel the timer.
#[derive(Debug)]
pub struct TimerHandle {
    // Set on cancel and on fire; whoever flips it first wins.
    done: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl TimerHandle {
    fn new(done: Arc<AtomicBool>, abort: Option<AbortHandle>) -> Self {
        Self { done, abort }
    }

    pub fn cancel(&self) {
        self.done.store(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// `true` once the timer has fired or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// Claim the right to run a task. Returns `false` if it was cancelled or
/// already ran.
fn claim(done: &AtomicBool) -> bool {
    !done.swap(true, Ordering::SeqCst)
}

// ── Tokio (wall clock) ──────────────────────────────────────────────────────

/// Timers backed by `tokio::time::sleep` on the given runtime.
///
/// `now_ms` reads the runtime's clock too, anchored to wall time when the
/// scheduler is built, so timestamps and expiry agree even when tokio time
/// is paused.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
    base: Instant,
    base_epoch_ms: u64,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        let base = {
            let _guard = handle.enter();
            Instant::now()
        };
        let base_epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            handle,
            base,
            base_epoch_ms,
        }
    }

    /// Scheduler on the runtime of the calling task, if there is one.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Clock for TokioScheduler {
    fn now_ms(&self) -> u64 {
        let _guard = self.handle.enter();
        self.base_epoch_ms
            .saturating_add(self.base.elapsed().as_millis() as u64)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if claim(&flag) {
                task();
            }
        });
        TimerHandle::new(done, Some(join.abort_handle()))
    }
}

// ── Manual (virtual clock) ──────────────────────────────────────────────────

struct Pending {
    deadline_ms: u64,
    seq: u64,
    done: Arc<AtomicBool>,
    task: TimerTask,
}

struct ManualState {
    now_ms: u64,
    next_seq: u64,
    queue: Vec<Pending>,
}

/// Deterministic scheduler whose clock only moves on [`ManualScheduler::advance`].
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now_ms,
                next_seq: 0,
                queue: Vec::new(),
            }),
        }
    }

    /// Move the clock forward, firing every due task in deadline order
    /// (scheduling order breaks ties). Tasks run without the internal lock
    /// held, so they may schedule or cancel other timers.
    pub fn advance(&self, by: Duration) {
        let target = {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.now_ms.saturating_add(by.as_millis() as u64)
        };

        loop {
            let next = {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                state.queue.retain(|p| !p.done.load(Ordering::SeqCst));
                let due = state
                    .queue
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.deadline_ms <= target)
                    .min_by_key(|(_, p)| (p.deadline_ms, p.seq))
                    .map(|(i, _)| i);
                match due {
                    Some(i) => {
                        let pending = state.queue.swap_remove(i);
                        state.now_ms = state.now_ms.max(pending.deadline_ms);
                        Some(pending)
                    },
                    None => {
                        state.now_ms = target;
                        None
                    },
                }
            };

            let Some(pending) = next else {
                break;
            };
            if claim(&pending.done) {
                (pending.task)();
            }
        }
    }

    /// Number of timers that are still waiting to fire.
    pub fn pending(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .queue
            .iter()
            .filter(|p| !p.done.load(Ordering::SeqCst))
            .count()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualScheduler {
    fn now_ms(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .now_ms
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let done = Arc::new(AtomicBool::new(false));
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let seq = state.next_seq;
        state.next_seq += 1;
        let deadline_ms = state.now_ms.saturating_add(delay.as_millis() as u64);
        state.queue.push(Pending {
            deadline_ms,
            seq,
            done: Arc::clone(&done),
            task,
        });
        TimerHandle::new(done, None)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::sync::atomic::AtomicUsize};

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> TimerTask) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |name: &'static str| -> TimerTask {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().unwrap().push(name))
        };
        (log, make)
    }

    #[test]
    fn manual_fires_in_deadline_order() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();
        scheduler.schedule(Duration::from_millis(300), task("c"));
        scheduler.schedule(Duration::from_millis(100), task("a"));
        scheduler.schedule(Duration::from_millis(100), task("b"));

        scheduler.advance(Duration::from_millis(99));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(scheduler.now_ms(), 99);

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);

        scheduler.advance(Duration::from_secs(10));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(scheduler.now_ms(), 10_100);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn manual_cancel_prevents_fire() {
        let scheduler = ManualScheduler::starting_at(5_000);
        let (log, task) = recorder();
        let handle = scheduler.schedule(Duration::from_millis(10), task("x"));
        assert_eq!(scheduler.pending(), 1);

        handle.cancel();
        assert!(handle.is_finished());
        assert_eq!(scheduler.pending(), 0);

        scheduler.advance(Duration::from_secs(1));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn manual_task_can_schedule_more_work() {
        let scheduler = Arc::new(ManualScheduler::new());
        let fired = Arc::new(AtomicUsize::new(0));

        let inner_sched = Arc::clone(&scheduler);
        let inner_fired = Arc::clone(&fired);
        scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                inner_fired.fetch_add(1, Ordering::SeqCst);
                let again = Arc::clone(&inner_fired);
                inner_sched.schedule(
                    Duration::from_millis(10),
                    Box::new(move || {
                        again.fetch_add(1, Ordering::SeqCst);
                    }),
                );
            }),
        );

        scheduler.advance(Duration::from_millis(25));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn manual_clock_tracks_fired_deadline() {
        let scheduler = Arc::new(ManualScheduler::new());
        let seen = Arc::new(Mutex::new(None));
        let clock = Arc::clone(&scheduler);
        let slot = Arc::clone(&seen);
        scheduler.schedule(
            Duration::from_millis(40),
            Box::new(move || *slot.lock().unwrap() = Some(clock.now_ms())),
        );
        scheduler.advance(Duration::from_millis(100));
        assert_eq!(*seen.lock().unwrap(), Some(40));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_fires_after_delay() {
        let scheduler = TokioScheduler::try_current().expect("inside runtime");
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = scheduler.schedule(
            Duration::from_millis(500),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(!fired.load(Ordering::SeqCst));
        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst));
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_cancel() {
        let scheduler = TokioScheduler::new(Handle::current());
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = scheduler.schedule(
            Duration::from_millis(50),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let start = scheduler.now_ms();

        tokio::time::advance(Duration::from_millis(1_500)).await;
        assert_eq!(scheduler.now_ms() - start, 1_500);

        let fired_at = Arc::new(Mutex::new(None));
        let clock = scheduler.clone();
        let slot = Arc::clone(&fired_at);
        scheduler.schedule(
            Duration::from_millis(250),
            Box::new(move || *slot.lock().unwrap() = Some(clock.now_ms())),
        );
        tokio::time::sleep(Duration::from_millis(300)).await;
        let fired_at = fired_at.lock().unwrap().unwrap();
        assert!(fired_at - start >= 1_750, "fired at +{}", fired_at - start);
        assert!(fired_at - start < 1_800, "fired at +{}", fired_at - start);
    }

    #[test]
    fn no_runtime_no_tokio_scheduler() {
        assert!(TokioScheduler::try_current().is_none());
    }
}
