//! General utilities shared across the crate.

use std::time::Duration;

use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Time Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Error returned for text that is not an `h:mm:ss` duration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time {0:?}, expected h:mm:ss")]
pub struct TimeFormatError(pub String);

/// Parses `h:mm:ss` (as reported by AVTransport) into milliseconds.
///
/// Durations past 24 hours parse fine; a total that does not fit in `u64`
/// milliseconds is an error. Minutes and seconds must be below 60. Fractional seconds (`0:00:01.500`) are accepted.
///
/// # Example
/// ```
/// use interlude_core::utils::hhmmss_to_millis;
/// assert_eq!(hhmmss_to_millis("0:01:30").unwrap(), 90_000);
/// assert_eq!(hhmmss_to_millis("26:00:00").unwrap(), 93_600_000);
/// assert!(hhmmss_to_millis("NOT_IMPLEMENTED").is_err());
/// ```
pub fn hhmmss_to_millis(text: &str) -> Result<u64, TimeFormatError> {
    let invalid = || TimeFormatError(text.to_string());

    let mut parts = text.trim().split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let hours: u64 = h.parse().map_err(|_| invalid())?;
    let minutes: u64 = m.parse().map_err(|_| invalid())?;
    let (secs, frac) = s.split_once('.').unwrap_or((s, ""));
    let seconds: u64 = secs.parse().map_err(|_| invalid())?;
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    let millis = if frac.is_empty() {
        0
    } else {
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        // Keep the first three digits, right-padded: ".5" is 500ms
        format!("{:0<3}", &frac[..frac.len().min(3)])
            .parse::<u64>()
            .map_err(|_| invalid())?
    };

    hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))
        .and_then(|s| s.checked_add(seconds))
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(invalid)
}

/// Formats milliseconds as `h:mm:ss`, truncating sub-second precision.
#[must_use]
pub fn millis_to_hhmmss(millis: u64) -> String {
    let total = millis / 1000;
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

/// Parses `h:mm:ss` into a [`Duration`].
pub fn parse_hhmmss(text: &str) -> Result<Duration, TimeFormatError> {
    hhmmss_to_millis(text).map(Duration::from_millis)
}

/// True when the text parses to exactly zero (the stream "no duration" value).
///
/// Unparseable text is not zero.
#[must_use]
pub fn is_zero_duration(text: &str) -> bool {
    matches!(hhmmss_to_millis(text), Ok(0))
}
