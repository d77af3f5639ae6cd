//! Effort strings and human-readable durations.
//!
//! Accepted inputs:
//!
//! ```text
//! 45        plain number, minutes
//! 1:30      hours and minutes (minutes below 60)
//! 1h30m     unit suffixes h, m, s in any combination
//! ```

use std::time::Duration;

use crate::error::DurationError;

/// Parse a duration string. Zero-length durations are rejected.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return Err(DurationError::Empty);
    }

    let parsed = if let Ok(minutes) = input.parse::<u64>() {
        minutes.checked_mul(60)
    } else if let Some((hours, minutes)) = input.split_once(':') {
        parse_clock(hours, minutes)
    } else {
        parse_units(&input)
    };
    let total_seconds = parsed.ok_or_else(|| DurationError::Format(input.clone()))?;

    if total_seconds == 0 {
        return Err(DurationError::Zero);
    }
    Ok(Duration::from_secs(total_seconds))
}

/// Read an effort attribute value. Anything unparseable counts as no effort.
pub fn parse_effort(value: &str) -> Option<Duration> {
    parse_duration(value).ok()
}

fn parse_clock(hours: &str, minutes: &str) -> Option<u64> {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(hours) || !digits(minutes) {
        return None;
    }
    let hours: u64 = hours.parse().ok()?;
    let minutes: u64 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)
}

fn parse_units(input: &str) -> Option<u64> {
    let mut total_seconds = 0u64;
    let mut current_number = String::new();

    for ch in input.chars() {
        if ch.is_ascii_digit() {
            current_number.push(ch);
        } else if matches!(ch, 'h' | 'm' | 's') {
            if current_number.is_empty() {
                return None;
            }
            let number: u64 = current_number.parse().ok()?;
            let scale = match ch {
                'h' => 3600,
                'm' => 60,
                _ => 1,
            };
            total_seconds = total_seconds.checked_add(number.checked_mul(scale)?)?;
            current_number.clear();
        } else if !ch.is_whitespace() {
            return None;
        }
    }

    // A trailing bare number has no unit.
    if !current_number.is_empty() {
        return None;
    }
    Some(total_seconds)
}

fn plural(n: u64) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format whole seconds as `25 minutes`, `1 minute 30 seconds` or `45 seconds`.
pub fn format_duration(seconds: u64) -> String {
    let minutes = seconds / 60;
    let remaining_seconds = seconds % 60;

    if minutes > 0 && remaining_seconds > 0 {
        format!(
            "{} minute{} {} second{}",
            minutes,
            plural(minutes),
            remaining_seconds,
            plural(remaining_seconds)
        )
    } else if minutes > 0 {
        format!("{} minute{}", minutes, plural(minutes))
    } else {
        format!("{} second{}", remaining_seconds, plural(remaining_seconds))
    }
}

/// Remaining-time report, rounded to the nearest second.
pub fn format_remaining(remaining: Duration) -> String {
    let seconds = (remaining.as_millis() + 500) / 1000;
    let seconds = u64::try_from(seconds).unwrap_or(u64::MAX);
    let minutes = seconds / 60;
    let seconds = seconds % 60;
    format!(
        "{} minute{} and {} second{} left",
        minutes,
        plural(minutes),
        seconds,
        plural(seconds)
    )
}
