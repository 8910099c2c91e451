use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// One hour of metered consumption as returned by the realtime chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Start of the hour, epoch seconds
    pub read_datetime: i64,
    pub gallons: Option<f64>,
    #[serde(default)]
    pub leak_gallons: Option<i64>,
    #[serde(default)]
    pub flags: Option<serde_json::Value>,
}

impl UsageRecord {
    /// Gallons with a missing reading counted as zero.
    pub fn gallons_or_zero(&self) -> f64 {
        self.gallons.unwrap_or(0.0)
    }
}

/// Envelope of `GET /index.php/rest/v1/Chart/RealTimeChart`.
#[derive(Debug, Deserialize)]
pub struct UsageHistoryPayload {
    pub data: UsageHistory,
}

#[derive(Debug, Deserialize)]
pub struct UsageHistory {
    pub series: Vec<UsageRecord>,
}

/// A meter the account can switch to through the user picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterInfo {
    pub meter_id: String,
    pub name: String,
    pub account_number: String,
    pub user_id: String,
    pub residence_id: String,
}

/// A usage record as exposed in sensor attributes and history responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedRecord {
    /// Local ISO 8601 timestamp with offset
    pub start: String,
    pub gallons: f64,
}

/// Keys of the derived metrics.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKey {
    GallonsForMostRecentHour,
    GallonsForMostRecentFullDay,
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SensorKey::GallonsForMostRecentHour => write!(f, "gallons_for_most_recent_hour"),
            SensorKey::GallonsForMostRecentFullDay => {
                write!(f, "gallons_for_most_recent_full_day")
            }
        }
    }
}

/// Units of measurement used in the system.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Unit {
    /// US gallons
    Gallon,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Unit::Gallon => write!(f, "gal"),
        }
    }
}
