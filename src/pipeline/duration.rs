//! Per-page hold duration from user input.
//!
//! Bad input never fails the job: it falls back to [`DEFAULT_DURATION`].

use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::error::{InputError, Result};

/// Seconds each page is shown when the user value is unusable
pub const DEFAULT_DURATION: f64 = 5.0;

/// Strictly parse a positive, finite number of seconds
pub fn try_parse_duration(raw: &str) -> std::result::Result<f64, InputError> {
    match raw.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        _ => Err(InputError::DurationParse {
            value: raw.to_string(),
        }),
    }
}

/// Parse a duration, falling back to [`DEFAULT_DURATION`]
pub fn parse_duration(raw: &str) -> f64 {
    parse_or(raw, DEFAULT_DURATION)
}

/// Parse a duration, falling back to `fallback`
pub fn parse_or(raw: &str, fallback: f64) -> f64 {
    try_parse_duration(raw).unwrap_or_else(|e| {
        warn!("{}, using default of {}s", e, fallback);
        fallback
    })
}

/// Duration from a JSON `duration` field that may be a number or a string
pub fn duration_from_value(value: Option<&Value>, fallback: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => parse_or(&n.to_string(), fallback),
        Some(Value::String(s)) => parse_or(s, fallback),
        Some(other) => parse_or(&other.to_string(), fallback),
        None => {
            warn!("No duration given, using default of {}s", fallback);
            fallback
        }
    }
}

/// Read the `duration` field of a JSON variables file
///
/// A missing or malformed file is reported, so the caller can decide to
/// fall back.
pub fn read_duration_variable<P: AsRef<Path>>(path: P, fallback: f64) -> Result<f64> {
    let path = path.as_ref();
    let unreadable = |reason: String| InputError::VariablesUnreadable {
        path: path.display().to_string(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
    let variables: Value = serde_json::from_str(&content).map_err(|e| unreadable(e.to_string()))?;

    Ok(duration_from_value(variables.get("duration"), fallback))
}
