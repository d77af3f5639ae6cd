//! Common test utilities for integration tests

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use effort_timer::error::NotifyError;
use effort_timer::notify::FallbackDisplay;
use effort_timer::scheduler::ManualClock;
use effort_timer::{Alert, Config, DeferredQueue, Notifier, RestTimer};

pub use effort_timer::prompt::ScriptedPrompt;

/// Alert that records delivered messages.
pub struct RecordingAlert(pub Rc<RefCell<Vec<String>>>);

impl Alert for RecordingAlert {
    fn alert(&mut self, message: &str) -> Result<(), NotifyError> {
        self.0.borrow_mut().push(message.to_string());
        Ok(())
    }
}

pub type TestTimer = RestTimer<DeferredQueue<ManualClock>>;

/// Timer on a manual clock plus the list of delivered alerts.
pub fn test_timer() -> (TestTimer, ManualClock, Rc<RefCell<Vec<String>>>) {
    let clock = ManualClock::new();
    let sent = Rc::new(RefCell::new(Vec::new()));
    let notifier = Notifier::External {
        alert: Box::new(RecordingAlert(sent.clone())),
        fallback: FallbackDisplay::new(Box::new(io::sink()), Duration::ZERO),
    };
    let timer = RestTimer::new(DeferredQueue::with_clock(clock.clone()), notifier);
    (timer, clock, sent)
}

/// `{default_duration: 50, threshold: 49, message: "done"}`
pub fn scenario_config() -> Config {
    Config {
        default_duration: 50,
        threshold: 49,
        message: "done".to_string(),
        ..Config::default()
    }
}
