//! Wall clock and one-shot timers for Wordrace.
//!
//! Rooms never touch `SystemTime` or `tokio::time` directly. They ask a
//! [`Clock`] for the current time and for delayed tasks, which keeps the
//! room state machine testable without real waits:
//!
//! - [`TokioClock`]: production clock. Timers are Tokio tasks.
//! - [`ManualClock`]: test clock. Time only moves when [`ManualClock::advance`]
//!   is called, and due timers fire inside that call.
//!
//! # Cancellation
//!
//! [`Clock::schedule`] returns a [`TimerHandle`]. Cancelling it guarantees the
//! task will not run if it hasn't started yet. A task that already ran is
//! unaffected, so callers still re-check their own state when the task's
//! effect arrives.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::AbortHandle;
use tracing::trace;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// A deferred unit of work run by a timer.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of time plus the ability to run a task after a delay.
pub trait Clock: Send + Sync + 'static {
    /// Current wall-clock time.
    fn now(&self) -> Timestamp;

    /// Runs `task` once, `delay` from now, unless the handle is cancelled first.
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

// ---------------------------------------------------------------------------
// TimerHandle
// ---------------------------------------------------------------------------

/// Cancel token for a scheduled task. Cheap to clone.
#[derive(Clone)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl TimerHandle {
    fn new(abort: Option<AbortHandle>) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            abort,
        }
    }

    /// Prevents the task from running. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TokioClock
// ---------------------------------------------------------------------------

/// System time plus Tokio-backed timers.
///
/// [`schedule`](Clock::schedule) spawns a task, so it must be called from
/// within a Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Timestamp)
            .unwrap_or(0)
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::SeqCst) {
                task();
            }
        });
        trace!(delay_ms = delay.as_millis() as u64, "timer scheduled");
        TimerHandle {
            cancelled,
            abort: Some(join.abort_handle()),
        }
    }
}

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

struct Pending {
    due: Timestamp,
    order: u64,
    handle: TimerHandle,
    task: TimerTask,
}

#[derive(Default)]
struct ManualState {
    now: Timestamp,
    next_order: u64,
    timers: Vec<Pending>,
}

/// A clock that only moves when told to. For tests.
///
/// Due timers fire synchronously inside [`advance`](Self::advance), in due
/// order (ties in scheduling order).
#[derive(Default)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: start,
                ..ManualState::default()
            }),
        }
    }

    /// Moves time forward by `by`, running every timer that comes due.
    ///
    /// Returns the number of tasks that ran. Tasks run without the clock's
    /// lock held, so they may schedule further timers.
    pub fn advance(&self, by: Duration) -> usize {
        let target = {
            let mut state = self.lock();
            state.now + by.as_millis() as Timestamp
        };

        let mut fired = 0;
        loop {
            let next = {
                let mut state = self.lock();
                state.timers.retain(|p| !p.handle.is_cancelled());
                let idx = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due <= target)
                    .min_by_key(|(_, p)| (p.due, p.order))
                    .map(|(i, _)| i);
                match idx {
                    Some(i) => {
                        let pending = state.timers.swap_remove(i);
                        state.now = state.now.max(pending.due);
                        Some(pending)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };

            match next {
                Some(pending) => {
                    (pending.task)();
                    fired += 1;
                }
                None => break,
            }
        }
        fired
    }

    /// Number of timers that are scheduled and not cancelled.
    pub fn pending(&self) -> usize {
        self.lock()
            .timers
            .iter()
            .filter(|p| !p.handle.is_cancelled())
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.lock().now
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::new(None);
        let mut state = self.lock();
        let due = state.now + delay.as_millis() as Timestamp;
        let order = state.next_order;
        state.next_order += 1;
        state.timers.push(Pending {
            due,
            order,
            handle: handle.clone(),
            task,
        });
        handle
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ManualClock")
            .field("now", &state.now)
            .field("timers", &state.timers.len())
            .finish()
    }
}
