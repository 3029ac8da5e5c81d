//! Interval parsing for monitor settings.
//!
//! Two textual forms are accepted:
//! - compact suffix form used by the delay tolerance (`2h`, `1h30m`, `90s`)
//! - spelled-out form used by the digest interval (`1 hour`, `30 minutes`, `2 days`)

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,

    #[error("no leading integer in '{0}'")]
    MissingNumber(String),

    #[error("no unit in '{0}'")]
    MissingUnit(String),

    #[error("unknown duration unit '{unit}' in '{input}'")]
    UnknownUnit { input: String, unit: String },

    #[error("duration '{0}' is too large")]
    Overflow(String),
}

/// Parse `"<integer> <unit>"` where unit is one of hour(s), minute(s), day(s).
///
/// Days are rewritten as hours. Any other unit is handed to [`parse_compact`]
/// as a suffix, so `"45 s"` is also valid.
pub fn parse_interval(s: &str) -> Result<Duration, DurationParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, rest) = trimmed.split_at(digits_end);
    let mut number: u64 = digits
        .parse()
        .map_err(|_| DurationParseError::MissingNumber(s.to_string()))?;

    let unit = rest.split_whitespace().next().unwrap_or("");
    if unit.is_empty() {
        return Err(DurationParseError::MissingUnit(s.to_string()));
    }

    let suffix = match unit {
        "hour" | "hours" => "h",
        "minute" | "minutes" => "m",
        "day" | "days" => {
            number = number
                .checked_mul(24)
                .ok_or_else(|| DurationParseError::Overflow(s.to_string()))?;
            "h"
        }
        other => other,
    };

    parse_compact(&format!("{number}{suffix}")).map_err(|e| match e {
        DurationParseError::UnknownUnit { unit, .. } | DurationParseError::MissingUnit(unit) => {
            DurationParseError::UnknownUnit {
                input: s.to_string(),
                unit,
            }
        }
        DurationParseError::Overflow(_) => DurationParseError::Overflow(s.to_string()),
        other => other,
    })
}

/// Parse a compact duration such as `2h`, `30m`, `1h30m`, `1d`.
///
/// `0m` is a valid zero duration: every cron not updated at this instant is stale.
pub fn parse_compact(s: &str) -> Result<Duration, DurationParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let mut total_secs: u64 = 0;
    let mut num_buf = String::new();
    let mut has_unit = false;

    for ch in trimmed.chars() {
        if ch.is_ascii_digit() {
            num_buf.push(ch);
            continue;
        }

        let n: u64 = num_buf
            .parse()
            .map_err(|_| DurationParseError::MissingNumber(s.to_string()))?;
        num_buf.clear();
        let factor = match ch {
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            other => {
                return Err(DurationParseError::UnknownUnit {
                    input: s.to_string(),
                    unit: other.to_string(),
                })
            }
        };
        total_secs = n
            .checked_mul(factor)
            .and_then(|secs| total_secs.checked_add(secs))
            .ok_or_else(|| DurationParseError::Overflow(s.to_string()))?;
        has_unit = true;
    }

    // Trailing digits with no unit
    if !num_buf.is_empty() || !has_unit {
        return Err(DurationParseError::MissingUnit(s.to_string()));
    }

    Ok(Duration::from_secs(total_secs))
}

/// Render a duration in compact form, largest unit hours (`24h`, `1h30m`, `45s`).
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }

    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if s > 0 {
        out.push_str(&format!("{s}s"));
    }
    out
}
