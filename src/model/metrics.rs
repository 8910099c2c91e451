use crate::error::StorageError;
use chrono::DateTime;
use chrono_tz::Tz;
use influxdb2::models::DataPoint;
use serde_derive::Serialize;

use super::traits::DataPointBuilder;
use super::types::{SensorKey, SerializedRecord};

/// Output of one derived-metric converter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorData {
    /// Gallons for the metric's period; `None` when the portal reported no reading
    pub state: Option<f64>,
    pub attrs: SensorAttributes,
    /// Start of the period covered by `state`, used as the point timestamp
    #[serde(skip)]
    pub period_start: Option<DateTime<Tz>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    pub related: Vec<SerializedRecord>,
}

/// A derived water-usage metric ready to be written to InfluxDB.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterUsageMetric {
    pub sensor: SensorKey,
    /// Portal subdomain the reading belongs to
    pub host: String,
    pub gallons: f64,
    pub period_start: DateTime<Tz>,
}

impl WaterUsageMetric {
    pub const MEASUREMENT: &'static str = "water_usage";

    /// Builds a metric from converter output, skipping sensors without state.
    pub fn from_sensor(sensor: SensorKey, host: &str, data: &SensorData) -> Option<Self> {
        Some(Self {
            sensor,
            host: host.to_string(),
            gallons: data.state?,
            period_start: data.period_start?,
        })
    }
}

impl DataPointBuilder for WaterUsageMetric {
    fn to_point(&self) -> Result<DataPoint, StorageError> {
        let timestamp = self
            .period_start
            .timestamp_nanos_opt()
            .ok_or_else(|| StorageError::InvalidDataPoint("Timestamp overflow".to_string()))?;

        DataPoint::builder(Self::MEASUREMENT)
            .tag("sensor", self.sensor.to_string())
            .tag("host", self.host.clone())
            .field("gallons", self.gallons)
            .timestamp(timestamp)
            .build()
            .map_err(|e| {
                StorageError::InvalidDataPoint(format!("Failed to build WaterUsageMetric: {}", e))
            })
    }
}
