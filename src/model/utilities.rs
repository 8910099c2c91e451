use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone};
use chrono_tz::Tz;

use super::types::{SerializedRecord, UsageRecord};

/// Converts a portal timestamp into the configured time zone.
///
/// The portal reports local wall-clock hours encoded as UTC epoch seconds, so
/// the UTC wall clock is relabeled with `tz` rather than shifted into it.
pub fn from_timestamp(timestamp: i64, tz: Tz) -> Option<DateTime<Tz>> {
    let naive = DateTime::from_timestamp(timestamp, 0)?.naive_utc();
    localize(&naive, tz)
}

/// Attaches `tz` to a local wall clock.
///
/// Ambiguous times (DST fall-back) take the earlier offset. Times inside a
/// DST spring-forward gap are read with the offset in force before the gap,
/// so they stay on their own calendar day.
pub fn localize(naive: &NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(*naive - TimeDelta::hours(1)))
            .earliest()
            .map(|before_gap| before_gap + TimeDelta::hours(1)),
    }
}

/// Formats a record's start as ISO 8601 with offset, e.g. `2024-06-19T19:00:00-07:00`.
pub fn local_isoformat(timestamp: i64, tz: Tz) -> String {
    from_timestamp(timestamp, tz)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string())
        .unwrap_or_default()
}

/// Converts records for returning in attributes and service responses.
pub fn serialize_records(records: &[UsageRecord], tz: Tz) -> Vec<SerializedRecord> {
    records
        .iter()
        .map(|record| SerializedRecord {
            start: local_isoformat(record.read_datetime, tz),
            gallons: record.gallons_or_zero(),
        })
        .collect()
}
