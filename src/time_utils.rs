// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Longest token lifetime taken at face value (one year).
const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z`
/// suffix (the format eBay filters expect).
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_utc_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Expiry for a token issued at `now` with an `expires_in` of `secs`.
///
/// The lifetime comes from the token endpoint, so it is clamped to
/// `0..=MAX_TOKEN_LIFETIME_SECS` before any arithmetic.
pub fn token_expiry(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    let secs = secs.clamp(0, MAX_TOKEN_LIFETIME_SECS);
    now.checked_add_signed(Duration::seconds(secs))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_uses_z_and_millis() {
        let date = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2025-03-04T05:06:07.000Z");
    }

    #[test]
    fn test_parse_normalizes_offset() {
        let parsed = parse_utc_rfc3339("2025-03-04T07:06:07+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap());
        assert!(parse_utc_rfc3339("yesterday").is_none());
    }

    #[test]
    fn test_token_expiry_plain() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(token_expiry(now, 7200), now + Duration::hours(2));
        assert_eq!(token_expiry(now, 0), now);
    }

    #[test]
    fn test_token_expiry_clamps_out_of_range_lifetimes() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(token_expiry(now, -30), now);
        assert_eq!(token_expiry(now, 100_000_000_000_000), now + Duration::days(365));
        assert_eq!(token_expiry(now, i64::MAX), now + Duration::days(365));
    }
}
