//! Textual duration resolution.
//!
//! Policy configuration carries durations as strings. Two syntaxes are
//! accepted:
//!
//! - a bare integer, interpreted as a count of **microseconds** (`"250"`),
//! - a structured expression with unit suffixes (`"100ms"`, `"2s"`,
//!   `"1h30m"`, `"1.5s"`); recognized units are `ns`, `us`/`µs`, `ms`, `s`,
//!   `m`, and `h`.
//!
//! The empty string resolves to [`Duration::ZERO`], meaning "disabled".
//! Anything else is an [`FaultError::InvalidDuration`] and must be treated
//! as fatal to policy construction.

use crate::core::error::FaultError;
use std::time::Duration;

/// Nanoseconds per recognized unit, longest suffix first so that `ms` is
/// not mistaken for `m` and `ns`/`us` are not mistaken for `s`.
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1_000.0),
    ("µs", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Resolves a textual duration value.
///
/// # Errors
///
/// Returns [`FaultError::InvalidDuration`] for malformed text, including
/// negative values, numbers without a unit, and unknown unit suffixes.
pub fn parse_duration(value: &str) -> Result<Duration, FaultError> {
    if value.is_empty() {
        return Ok(Duration::ZERO);
    }

    if let Ok(micros) = value.parse::<u64>() {
        return Ok(Duration::from_micros(micros));
    }

    parse_structured(value)
}

fn parse_structured(value: &str) -> Result<Duration, FaultError> {
    let mut total = Duration::ZERO;
    let mut rest = value;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(FaultError::invalid_duration(
                value,
                format!("expected a number at '{rest}'"),
            ));
        }

        let (number, after) = rest.split_at(number_len);
        let amount: f64 = number.parse().map_err(|_| {
            FaultError::invalid_duration(value, format!("'{number}' is not a valid number"))
        })?;

        let (suffix, nanos_per_unit) = UNITS
            .iter()
            .find(|(suffix, _)| after.starts_with(suffix))
            .ok_or_else(|| {
                if after.is_empty() {
                    FaultError::invalid_duration(value, format!("missing unit after '{number}'"))
                } else {
                    FaultError::invalid_duration(value, format!("unknown unit at '{after}'"))
                }
            })?;

        total += Duration::from_nanos((amount * nanos_per_unit).round() as u64);
        rest = &after[suffix.len()..];
    }

    Ok(total)
}
