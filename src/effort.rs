//! Effort gate: runs before an activity is clocked in.
//!
//! Makes sure the current entry carries an effort estimate and arms the
//! rest timer when that estimate is longer than the configured threshold.
//! A missing or unreadable effort never arms a timer.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::duration::parse_effort;
use crate::outline::Outline;
use crate::prompt::Prompt;
use crate::scheduler::Scheduler;
use crate::timer::{RestTimer, StartOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Armed(StartOutcome),
    /// Effort is known but not above the threshold.
    BelowThreshold { effort: Duration },
    /// No usable effort on the entry.
    NoEffort,
}

pub struct EffortGate;

impl EffortGate {
    pub fn before_clock_in<S: Scheduler>(
        entry: &mut dyn Outline,
        timer: &mut RestTimer<S>,
        config: &Config,
        prompt: &mut dyn Prompt,
    ) -> GateOutcome {
        let property = config.effort_property.as_str();

        if !has_value(entry.get_attribute(property).as_deref()) {
            let question = format!("{property}: ");
            if let Some(answer) = prompt.choose(&question, &config.presets) {
                let answer = answer.trim();
                if !answer.is_empty() {
                    entry.set_attribute(property, answer);
                    debug!(property, value = answer, "stored effort");
                }
            }
        }

        let Some(effort) = entry.get_attribute(property).as_deref().and_then(parse_effort) else {
            debug!(property, "no usable effort, not arming");
            return GateOutcome::NoEffort;
        };

        let threshold = Duration::from_secs(u64::from(config.threshold) * 60);
        if effort > threshold {
            info!(
                effort_secs = effort.as_secs(),
                threshold = config.threshold,
                "effort above threshold"
            );
            GateOutcome::Armed(timer.start(Some(config.threshold), config, prompt))
        } else {
            GateOutcome::BelowThreshold { effort }
        }
    }
}

fn has_value(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
