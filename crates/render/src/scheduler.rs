//! Frame-deferred task queue plus a millisecond timer queue.
//!
//! Tasks enqueued for the next frame run at the start of the next
//! [`FrameScheduler::advance`] call. Timed callbacks run once their delay has
//! elapsed on the scheduler's monotonic clock. Anything enqueued while a batch
//! is being drained waits for the following frame.

use std::collections::{BTreeMap, VecDeque};

/// Handle of a timed callback; used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(pub u64);

#[derive(Debug)]
struct Timer<T> {
    due_ms: u64,
    task: T,
}

/// Explicit next-frame queue and timer wheel.
#[derive(Debug)]
pub struct FrameScheduler<T> {
    now_ms: u64,
    next_id: u64,
    next_frame: VecDeque<T>,
    timers: BTreeMap<CallbackId, Timer<T>>,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            next_frame: VecDeque::new(),
            timers: BTreeMap::new(),
        }
    }
}

impl<T> FrameScheduler<T> {
    /// Empty scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Run `task` before the next frame renders.
    pub fn enqueue_before_next_frame(&mut self, task: T) {
        self.next_frame.push_back(task);
    }

    /// Run `task` once `delay_ms` has elapsed.
    pub fn register_callback(&mut self, task: T, delay_ms: u64) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            id,
            Timer {
                due_ms: self.now_ms + delay_ms,
                task,
            },
        );
        id
    }

    /// Cancel a timed callback, handing back its task if it was still pending.
    pub fn unregister_callback(&mut self, id: CallbackId) -> Option<T> {
        self.timers.remove(&id).map(|t| t.task)
    }

    /// Whether `id` is still pending.
    pub fn is_pending(&self, id: CallbackId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Drop every queued task (next-frame and timed) matching `pred`.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.len();
        self.next_frame.retain(|t| !pred(t));
        self.timers.retain(|_, timer| !pred(&timer.task));
        before - self.len()
    }

    /// Total queued tasks.
    pub fn len(&self) -> usize {
        self.next_frame.len() + self.timers.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advance one frame by `dt_ms`.
    ///
    /// Returns the next-frame tasks first (in enqueue order, without an id),
    /// then every timer that came due (ordered by due time, then id).
    pub fn advance(&mut self, dt_ms: u64) -> Vec<(Option<CallbackId>, T)> {
        self.now_ms += dt_ms;
        let mut ready: Vec<(Option<CallbackId>, T)> =
            self.next_frame.drain(..).map(|t| (None, t)).collect();

        let mut due: Vec<(u64, CallbackId)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.due_ms <= self.now_ms)
            .map(|(id, t)| (t.due_ms, *id))
            .collect();
        due.sort();
        for (_, id) in due {
            if let Some(timer) = self.timers.remove(&id) {
                ready.push((Some(id), timer.task));
            }
        }
        ready
    }
}
