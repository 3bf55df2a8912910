//! Date/time utilities for lanshare.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with second precision (e.g. "2024-01-15T10:30:00Z").
pub fn to_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format an optional timestamp, keeping `None` for "never".
pub fn to_rfc3339_opt(dt: Option<&DateTime<Utc>>) -> Option<String> {
    dt.map(to_rfc3339)
}

/// Convert a filesystem timestamp to whole seconds since the Unix epoch.
///
/// Times before the epoch come out negative.
pub fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
