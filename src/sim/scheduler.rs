//! Cooperative virtual-clock scheduler
//!
//! Repeating timers on a single millisecond clock. Every timer is owned
//! through a [`TimerHandle`]; cancelling the handle guarantees the timer
//! never fires again. Timers due at the same instant fire in install order.

use std::collections::BTreeMap;

/// Cancel token for an installed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

/// What a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// One second of the session countdown
    Countdown,
    /// Spawn one object
    Spawn,
    /// Advance the simulation one frame
    Frame,
}

#[derive(Debug, Clone)]
struct Timer {
    kind: TimerKind,
    interval_ms: u64,
    next_due_ms: u64,
}

/// Millisecond clock plus the set of live repeating timers
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    timers: BTreeMap<TimerHandle, Timer>,
    next_handle: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock value
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Install a repeating timer whose first firing is one interval from now
    pub fn every(&mut self, kind: TimerKind, interval_ms: u64) -> TimerHandle {
        let interval_ms = interval_ms.max(1);
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.timers.insert(
            handle,
            Timer {
                kind,
                interval_ms,
                next_due_ms: self.now_ms + interval_ms,
            },
        );
        handle
    }

    /// Cancel a timer; returns false if it was already gone
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    /// Cancel `previous` (if any) and install a replacement in one step
    pub fn reschedule(
        &mut self,
        previous: Option<TimerHandle>,
        kind: TimerKind,
        interval_ms: u64,
    ) -> TimerHandle {
        if let Some(handle) = previous {
            self.cancel(handle);
        }
        self.every(kind, interval_ms)
    }

    /// Cancel every timer
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    /// Number of live timers of a kind
    pub fn active_count(&self, kind: TimerKind) -> usize {
        self.timers.values().filter(|t| t.kind == kind).count()
    }

    /// Interval of a live timer
    pub fn interval_ms(&self, handle: TimerHandle) -> Option<u64> {
        self.timers.get(&handle).map(|t| t.interval_ms)
    }

    /// Pop the earliest timer due at or before `deadline_ms`, advancing the
    /// clock to its due time and re-arming it. Returns `None` once nothing
    /// else is due, leaving the clock at `deadline_ms`.
    ///
    /// Callers fire timers one at a time so a handler may cancel or
    /// reschedule other timers before they are considered.
    pub fn next_due(&mut self, deadline_ms: u64) -> Option<(TimerHandle, TimerKind)> {
        let (handle, due) = self
            .timers
            .iter()
            .map(|(h, t)| (*h, t.next_due_ms))
            .filter(|(_, due)| *due <= deadline_ms)
            .min_by_key(|(h, due)| (*due, *h))?;

        self.now_ms = self.now_ms.max(due);
        let timer = self.timers.get_mut(&handle)?;
        timer.next_due_ms += timer.interval_ms;
        Some((handle, timer.kind))
    }

    /// Move the clock forward to `deadline_ms` without firing anything
    pub fn settle(&mut self, deadline_ms: u64) {
        self.now_ms = self.now_ms.max(deadline_ms);
    }
}
