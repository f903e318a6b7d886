//! Canonical timestamp handling
//!
//! Every stored instant is UTC with millisecond precision and serializes as
//! `YYYY-MM-DDTHH:MM:SS.mmmZ`. Partner feeds deliver either Unix epoch
//! milliseconds or free-form ISO-8601 strings; both collapse into
//! `DateTime<Utc>` here.

use chrono::{DateTime, Duration, Timelike, Utc};

/// Earliest plausible transaction time: 2000-01-01T00:00:00Z in epoch millis.
pub const MIN_TRANSACTION_TIME_MS: i64 = 946_684_800_000;

/// Canonical wire format: UTC with millisecond precision.
pub const ISO_MILLIS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Latest plausible transaction time: one hundred years from now.
pub fn max_plausible_time() -> DateTime<Utc> {
    Utc::now() + Duration::days(36_525)
}

/// Convert Unix epoch milliseconds to a UTC instant.
///
/// Returns `None` for values outside the chrono-representable range.
pub fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Parse an ISO-8601 instant (any offset) and pin it to UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Drop sub-millisecond precision so formatting and reloading round-trip.
pub fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = dt.nanosecond() / 1_000_000 * 1_000_000;
    dt.with_nanosecond(nanos).unwrap_or(dt)
}

/// The current instant, truncated to millisecond precision.
pub fn now_millis() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

/// Render an instant in the canonical wire format.
pub fn format_millis(dt: &DateTime<Utc>) -> String {
    dt.format(ISO_MILLIS_FORMAT).to_string()
}

/// Serde adapter for the canonical `YYYY-MM-DDTHH:MM:SS.mmmZ` form.
pub mod iso_millis {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_millis(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_instant(&s)
            .map(truncate_to_millis)
            .ok_or_else(|| de::Error::custom(format!("invalid instant: {s}")))
    }
}
