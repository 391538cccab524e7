use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{PulseError, Result};

/// RFC3339 timestamp, or a duration meaning "that long before now".
pub fn parse_time_or_relative(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Ok(duration) = humantime::parse_duration(input) {
        return Utc::now()
            .checked_sub_signed(to_chrono(duration)?)
            .ok_or_else(|| PulseError::Parse(format!("{input} ago is out of range")));
    }

    Err(PulseError::Parse(format!(
        "expected RFC3339 time or duration, got {input}"
    )))
}

pub fn parse_duration_str(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| PulseError::Parse(format!("invalid duration {input}: {e}")))
}

/// Trailing window such as `24h` as a chrono duration.
pub fn parse_window(input: &str) -> Result<chrono::Duration> {
    to_chrono(parse_duration_str(input)?)
}

fn to_chrono(duration: Duration) -> Result<chrono::Duration> {
    chrono::Duration::from_std(duration)
        .map_err(|e| PulseError::Parse(format!("failed to parse duration to chrono: {e}")))
}
