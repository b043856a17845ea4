//! Parsing and formatting of human-readable durations.

use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to milliseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
    ("h", 3_600_000.0),
];

/// Parse duration strings like "5s", "500ms", "1.5m" or "1h".
///
/// A bare number is taken as milliseconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            return from_millis(val_str, *multiplier, s);
        }
    }

    from_millis(s, 1.0, s)
}

fn from_millis(val_str: &str, multiplier: f64, original: &str) -> Result<Duration> {
    let val: f64 = match val_str.trim().parse() {
        Ok(v) => v,
        Err(_) => bail!("Unknown duration format: {}", original),
    };
    if !val.is_finite() || val < 0.0 {
        bail!("Duration must be a non-negative number: {}", original);
    }
    match Duration::try_from_secs_f64(val * multiplier / 1_000.0) {
        Ok(d) => Ok(d),
        Err(_) => bail!("Duration is too large: {}", original),
    }
}

/// Format how long ago something happened, e.g. "4.2s", "3m 10s", "2h 5m".
pub fn format_age(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3_600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3_600, (secs % 3_600) / 60)
    }
}
