//! Rest timer armed from effort estimates.
//!
//! Before an activity is clocked in, [`EffortGate`] reads (or asks for) the
//! entry's effort. Efforts longer than the configured threshold arm a one-shot
//! [`RestTimer`] which notifies the user when it fires.

pub mod config;
pub mod duration;
pub mod effort;
pub mod error;
pub mod hooks;
pub mod notify;
pub mod outline;
pub mod prompt;
pub mod scheduler;
pub mod timer;

pub use config::Config;
pub use effort::{EffortGate, GateOutcome};
pub use notify::{Alert, Delivery, Notifier};
pub use outline::{Entry, Outline};
pub use prompt::{Prompt, ScriptedPrompt};
pub use scheduler::{DeferredQueue, Scheduler, TimerHandle};
pub use timer::{RestTimer, StartOutcome};
