//! One-shot deferred callbacks.
//!
//! The [`Scheduler`] trait is the host's "run after N seconds" primitive.
//! [`DeferredQueue`] implements it for a single-threaded event loop: nothing
//! runs on its own, the loop asks for [`Scheduler::take_due`] handles once
//! [`DeferredQueue::next_deadline`] has passed and dispatches them.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::debug;

/// Opaque reference to a scheduled one-shot callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

pub trait Scheduler {
    /// Schedule a callback `delay` from now.
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle;

    /// Time until `handle` fires, or `None` if it is no longer pending.
    fn time_until(&self, handle: TimerHandle) -> Option<Duration>;

    /// Cancel a pending callback. Returns `false` if it was not pending.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Remove and return every handle whose deadline has passed, earliest first.
    fn take_due(&mut self) -> Vec<TimerHandle>;
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

#[derive(Debug)]
pub struct DeferredQueue<C: Clock = SystemClock> {
    clock: C,
    next_id: u64,
    pending: BTreeMap<TimerHandle, Instant>,
}

impl DeferredQueue<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for DeferredQueue<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> DeferredQueue<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            next_id: 1,
            pending: BTreeMap::new(),
        }
    }

    /// Time until the earliest pending callback is due.
    pub fn next_deadline(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.pending
            .values()
            .min()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl<C: Clock> Scheduler for DeferredQueue<C> {
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.insert(handle, self.clock.now() + delay);
        debug!(handle = handle.0, delay_secs = delay.as_secs(), "scheduled");
        handle
    }

    fn time_until(&self, handle: TimerHandle) -> Option<Duration> {
        let now = self.clock.now();
        self.pending
            .get(&handle)
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let removed = self.pending.remove(&handle).is_some();
        debug!(handle = handle.0, removed, "cancel");
        removed
    }

    fn take_due(&mut self) -> Vec<TimerHandle> {
        let now = self.clock.now();
        let mut due: Vec<(Instant, TimerHandle)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(handle, deadline)| (*deadline, *handle))
            .collect();
        due.sort();
        for (_, handle) in &due {
            self.pending.remove(handle);
        }
        due.into_iter().map(|(_, handle)| handle).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_after_delay() {
        let clock = ManualClock::new();
        let mut queue = DeferredQueue::with_clock(clock.clone());
        let handle = queue.schedule_once(Duration::from_secs(60));

        clock.advance(Duration::from_secs(59));
        assert!(queue.take_due().is_empty());
        assert_eq!(queue.time_until(handle), Some(Duration::from_secs(1)));

        clock.advance(Duration::from_secs(1));
        assert_eq!(queue.take_due(), vec![handle]);
        assert_eq!(queue.time_until(handle), None);
        assert!(queue.take_due().is_empty());
    }

    #[test]
    fn cancelled_handle_never_fires() {
        let clock = ManualClock::new();
        let mut queue = DeferredQueue::with_clock(clock.clone());
        let handle = queue.schedule_once(Duration::from_secs(5));

        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        clock.advance(Duration::from_secs(10));
        assert!(queue.take_due().is_empty());
    }

    #[test]
    fn due_handles_come_out_earliest_first() {
        let clock = ManualClock::new();
        let mut queue = DeferredQueue::with_clock(clock.clone());
        let late = queue.schedule_once(Duration::from_secs(20));
        let early = queue.schedule_once(Duration::from_secs(10));

        assert_eq!(queue.next_deadline(), Some(Duration::from_secs(10)));
        clock.advance(Duration::from_secs(30));
        assert_eq!(queue.next_deadline(), Some(Duration::ZERO));
        assert_eq!(queue.take_due(), vec![early, late]);
        assert_eq!(queue.pending_count(), 0);
    }
}
