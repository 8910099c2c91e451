//! Test fixtures and common test data.
//!
//! Timestamps follow the portal's convention: the UTC wall clock of an epoch
//! value is the local wall clock of the reading.

use crate::model::UsageRecord;
use chrono::{NaiveDate, TimeZone, Utc};

/// Builds one reading with the portal's default leak and flag values.
pub fn record(read_datetime: i64, gallons: Option<f64>) -> UsageRecord {
    UsageRecord {
        read_datetime,
        gallons,
        leak_gallons: Some(0),
        flags: None,
    }
}

/// The four readings served by the realtime chart fixture.
pub fn hourly_records() -> Vec<UsageRecord> {
    vec![
        record(1718823600, Some(7.48)),
        record(1718827200, Some(0.0)),
        record(1718830800, Some(7.48)),
        record(1718834400, Some(0.0)),
    ]
}

/// Epoch value whose UTC wall clock reads `date` at `hour`:00.
pub fn wall_clock(date: NaiveDate, hour: u32) -> i64 {
    Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
        .timestamp()
}

/// Consecutive hourly readings starting at `date` `start_hour`:00, one per
/// entry of `gallons`. Runs past midnight continue into the next day.
pub fn hourly_run(date: NaiveDate, start_hour: u32, gallons: &[f64]) -> Vec<UsageRecord> {
    let start = wall_clock(date, start_hour);
    gallons
        .iter()
        .enumerate()
        .map(|(i, gallons)| record(start + i as i64 * 3600, Some(*gallons)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 19).unwrap();
        assert_eq!(wall_clock(date, 19), 1718823600);
    }

    #[test]
    fn test_hourly_run_crosses_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 19).unwrap();
        let run = hourly_run(date, 23, &[1.0, 2.0]);
        assert_eq!(run[1].read_datetime - run[0].read_datetime, 3600);
        assert_eq!(
            run[1].read_datetime,
            wall_clock(NaiveDate::from_ymd_opt(2024, 6, 20).unwrap(), 0)
        );
    }
}
