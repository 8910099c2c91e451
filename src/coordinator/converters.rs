//! Pure converters deriving sensor data from the hourly series.

use crate::model::{
    from_timestamp, local_isoformat, localize, serialize_records, SensorAttributes, SensorData,
    SensorKey, UsageRecord,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;

pub type DataConverter = fn(&[UsageRecord], Tz) -> SensorData;

/// Converters run after every successful fetch, in this order.
pub const DATA_CONVERTERS: [(SensorKey, DataConverter); 2] = [
    (SensorKey::GallonsForMostRecentHour, most_recent_hour),
    (SensorKey::GallonsForMostRecentFullDay, most_recent_full_day),
];

/// Number of trailing records exposed with the most recent hour.
const RECENT_WINDOW: usize = 24;

/// Hour of day from which a record marks its day as complete.
const LAST_HOUR_OF_DAY: u32 = 23;

/// Gallons of the last reported hour, with the trailing day of readings.
pub fn most_recent_hour(hourly: &[UsageRecord], tz: Tz) -> SensorData {
    let window = &hourly[hourly.len().saturating_sub(RECENT_WINDOW)..];
    let last = window.last();

    SensorData {
        state: last.and_then(|record| record.gallons),
        attrs: SensorAttributes {
            start: last.map(|record| local_isoformat(record.read_datetime, tz)),
            related: serialize_records(window, tz),
        },
        period_start: last.and_then(|record| from_timestamp(record.read_datetime, tz)),
    }
}

/// Total gallons of the latest local day that has a reading for its last hour.
pub fn most_recent_full_day(hourly: &[UsageRecord], tz: Tz) -> SensorData {
    let records = records_from_first_full_day(hourly, tz);
    let gallons = records.iter().map(UsageRecord::gallons_or_zero).sum();
    let period_start = records
        .first()
        .and_then(|record| from_timestamp(record.read_datetime, tz))
        .and_then(|local| start_of_local_day(local.date_naive(), tz));

    SensorData {
        state: Some(gallons),
        attrs: SensorAttributes {
            start: None,
            related: serialize_records(&records, tz),
        },
        period_start,
    }
}

/// Scans backward for the first record at or after 23:00 local, then keeps
/// every record of that local day. Records of later, partial days are
/// skipped and the scan stops at the first record of an earlier day.
///
/// The result is in chronological order.
pub fn records_from_first_full_day(hourly: &[UsageRecord], tz: Tz) -> Vec<UsageRecord> {
    let mut full_day = Vec::new();
    let mut anchor: Option<NaiveDate> = None;

    for record in hourly.iter().rev() {
        let Some(local) = from_timestamp(record.read_datetime, tz) else {
            continue;
        };
        let day = local.date_naive();

        match anchor {
            Some(anchor_day) if day < anchor_day => break,
            Some(anchor_day) if day == anchor_day => full_day.push(record.clone()),
            Some(_) => {}
            None if local.hour() >= LAST_HOUR_OF_DAY => {
                full_day.push(record.clone());
                anchor = Some(day);
            }
            None => {}
        }
    }

    full_day.reverse();
    full_day
}

fn start_of_local_day(day: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
    localize(&day.and_time(NaiveTime::MIN), tz)
}
