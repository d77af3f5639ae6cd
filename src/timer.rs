//! Rest timer controller.
//!
//! Holds at most one armed one-shot callback.
//!
//! ```text
//! Idle --start--> Armed --fires--> Idle
//! Armed --cancel--> Idle
//! Armed --start (confirmed)--> Armed   new handle replaces the old one
//! Armed --start (declined)--> Armed    old handle kept, remaining time reported
//! ```

use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::duration::{format_duration, format_remaining};
use crate::hooks::execute_hook;
use crate::notify::{Delivery, Notifier};
use crate::prompt::Prompt;
use crate::scheduler::{Scheduler, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTimer {
    pub handle: TimerHandle,
    pub minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started {
        handle: TimerHandle,
        minutes: u32,
    },
    Replaced {
        previous: TimerHandle,
        handle: TimerHandle,
        minutes: u32,
    },
    /// The user kept the running timer.
    Kept {
        handle: TimerHandle,
        remaining: Duration,
    },
}

pub struct RestTimer<S: Scheduler> {
    scheduler: S,
    notifier: Notifier,
    active: Option<ActiveTimer>,
}

impl<S: Scheduler> RestTimer<S> {
    pub fn new(scheduler: S, notifier: Notifier) -> Self {
        Self {
            scheduler,
            notifier,
            active: None,
        }
    }

    /// Swap the notification capability after a preference change.
    pub fn set_notifier(&mut self, notifier: Notifier) {
        self.notifier = notifier;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_armed(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<ActiveTimer> {
        self.active
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Time until the armed timer fires, without reporting it.
    pub fn time_left(&self) -> Option<Duration> {
        let active = self.active?;
        Some(self.scheduler.time_until(active.handle).unwrap_or_default())
    }

    /// Report the time left on the armed timer.
    pub fn remaining(&self, prompt: &mut dyn Prompt) -> Option<Duration> {
        match self.time_left() {
            Some(left) => {
                prompt.message(&format_remaining(left));
                Some(left)
            }
            None => {
                prompt.message("No rest timer active");
                None
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm the timer for `minutes` (the configured default when `None`).
    pub fn start(
        &mut self,
        minutes: Option<u32>,
        config: &Config,
        prompt: &mut dyn Prompt,
    ) -> StartOutcome {
        let previous = match self.active {
            Some(active) => {
                let left = self.time_left().unwrap_or_default();
                let question = format!(
                    "A rest timer is already running ({}). Replace it?",
                    format_remaining(left)
                );
                if !prompt.confirm(&question) {
                    let remaining = self.remaining(prompt).unwrap_or_default();
                    return StartOutcome::Kept {
                        handle: active.handle,
                        remaining,
                    };
                }
                self.scheduler.cancel(active.handle);
                self.active = None;
                Some(active.handle)
            }
            None => None,
        };

        let minutes = minutes.unwrap_or(config.default_duration).max(1);
        let handle = self
            .scheduler
            .schedule_once(Duration::from_secs(u64::from(minutes) * 60));
        self.active = Some(ActiveTimer { handle, minutes });
        info!(handle = handle.id(), minutes, "rest timer armed");

        prompt.message(&format!(
            "Rest timer set for {}",
            format_duration(u64::from(minutes) * 60)
        ));
        execute_hook("timer_start", config.hooks.timer_start.as_deref());

        match previous {
            Some(previous) => StartOutcome::Replaced {
                previous,
                handle,
                minutes,
            },
            None => StartOutcome::Started { handle, minutes },
        }
    }

    /// Disarm the timer. Returns `false` if nothing was armed.
    pub fn cancel(&mut self, prompt: &mut dyn Prompt) -> bool {
        let Some(active) = self.active.take() else {
            prompt.message("No rest timer active");
            return false;
        };
        self.scheduler.cancel(active.handle);
        info!(handle = active.handle.id(), "rest timer cancelled");
        prompt.message("Rest timer cancelled");
        true
    }

    /// Completion callback. Ignores handles other than the armed one, so a
    /// replaced or cancelled timer never notifies.
    pub fn on_complete(
        &mut self,
        handle: TimerHandle,
        config: &Config,
        prompt: &mut dyn Prompt,
    ) -> Option<Delivery> {
        if self.active.map(|a| a.handle) != Some(handle) {
            debug!(handle = handle.id(), "ignoring stale timer");
            return None;
        }
        self.active = None;

        let delivery = self.notifier.deliver(&config.message);
        info!(handle = handle.id(), ?delivery, "rest timer finished");
        if delivery == Delivery::Dropped {
            prompt.message(&config.message);
        }
        execute_hook("timer_end", config.hooks.timer_end.as_deref());
        Some(delivery)
    }

    /// Run completion for every due handle. Returns how many notified.
    pub fn dispatch_due(&mut self, config: &Config, prompt: &mut dyn Prompt) -> usize {
        let mut fired = 0;
        for handle in self.scheduler.take_due() {
            if self.on_complete(handle, config, prompt).is_some() {
                fired += 1;
            }
        }
        fired
    }
}
