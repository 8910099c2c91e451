//! The `get_hourly_history` query over a loaded entry.

use crate::entry::EntryRegistry;
use crate::error::ServiceError;
use crate::model::{from_timestamp, localize, serialize_records, SerializedRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

fn default_cached() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlyHistoryRequest {
    pub config_entry: String,
    /// `false` refreshes the coordinator before reading
    #[serde(default = "default_cached")]
    pub cached: bool,
    #[serde(default)]
    pub start: Option<DateInput>,
    #[serde(default)]
    pub end: Option<DateInput>,
    #[serde(default)]
    pub meter_id: Option<String>,
}

/// A bound of the requested range: epoch seconds or an ISO 8601 string.
///
/// Any other JSON value is kept as `Other` so it can be reported back as an
/// invalid date.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Timestamp(i64),
    Text(String),
    Other(serde_json::Value),
}

impl fmt::Display for DateInput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DateInput::Timestamp(value) => write!(f, "{}", value),
            DateInput::Text(value) => write!(f, "{}", value),
            DateInput::Other(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyHistoryResponse {
    pub history: Vec<SerializedRecord>,
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Interprets a range bound; `0`, `""` and absent values mean unbounded.
///
/// Integers are UTC epoch seconds. Strings without an offset are read as
/// local time in `tz`.
pub fn parse_date(input: Option<&DateInput>, tz: Tz) -> Result<Option<DateTime<Tz>>, ServiceError> {
    match input {
        None | Some(DateInput::Timestamp(0)) => Ok(None),
        Some(DateInput::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(DateInput::Timestamp(value)) => DateTime::from_timestamp(*value, 0)
            .map(|utc| Some(utc.with_timezone(&tz)))
            .ok_or_else(|| ServiceError::invalid_date(value)),
        Some(DateInput::Text(text)) => parse_text(text, tz)
            .map(Some)
            .ok_or_else(|| ServiceError::invalid_date(text)),
        Some(other @ DateInput::Other(_)) => Err(ServiceError::invalid_date(other)),
    }
}

fn parse_text(text: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let text = text.trim();
    // "2024-06-19 19:30:00" is accepted like "2024-06-19T19:30:00"
    let normalized = match text.as_bytes().get(10) {
        Some(b' ') => format!("{}T{}", &text[..10], &text[11..]),
        _ => text.to_string(),
    };

    if let Ok(aware) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(aware.with_timezone(&tz));
    }
    if let Ok(aware) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M%:z") {
        return Some(aware.with_timezone(&tz));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })?;

    localize(&naive, tz)
}

/// Returns the hourly records of an entry between `start` and `end`, inclusive.
pub async fn get_hourly_history(
    entries: &EntryRegistry,
    request: &HourlyHistoryRequest,
) -> Result<HourlyHistoryResponse, ServiceError> {
    let loaded = entries
        .get(&request.config_entry)
        .ok_or_else(|| ServiceError::InvalidConfigEntry {
            config_entry: request.config_entry.clone(),
        })?;
    let coordinator = &loaded.coordinator;
    let unloaded = || ServiceError::UnloadedConfigEntry {
        title: loaded.entry.title.clone(),
    };
    if coordinator.data().is_none() {
        return Err(unloaded());
    }

    let tz = coordinator.time_zone();
    let start = parse_date(request.start.as_ref(), tz)?;
    let end = parse_date(request.end.as_ref(), tz)?;

    if !request.cached {
        if let Err(e) = coordinator.refresh().await {
            tracing::warn!(
                entry = %loaded.entry.entry_id,
                error = %e,
                "Refresh before history query failed, reading last data"
            );
        }
    }

    let other_meter = request
        .meter_id
        .as_deref()
        .filter(|id| !id.is_empty() && Some(*id) != coordinator.meter_id());
    let hourly = match other_meter {
        Some(meter_id) => coordinator.fetch_for_meter(meter_id).await?,
        None => coordinator.data().ok_or_else(unloaded)?.hourly.clone(),
    };

    let records: Vec<_> = hourly
        .into_iter()
        .filter(|record| {
            let Some(local) = from_timestamp(record.read_datetime, tz) else {
                return false;
            };
            start.map_or(true, |start| local >= start) && end.map_or(true, |end| local <= end)
        })
        .collect();

    Ok(HourlyHistoryResponse {
        history: serialize_records(&records, tz),
    })
}
