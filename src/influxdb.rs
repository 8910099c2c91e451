use crate::config::InfluxConfig;
use crate::coordinator::CoordinatorData;
use crate::error::StorageError;
use crate::model::{DataPointBuilder, WaterUsageMetric};
use futures::prelude::stream;
use influxdb2::models::DataPoint;

pub struct Client {
    client: influxdb2::Client,
    bucket: String,
}

impl Client {
    pub(crate) fn new(config: InfluxConfig) -> Self {
        let client = influxdb2::Client::new(config.url, config.org, config.token);
        Self {
            client,
            bucket: config.bucket,
        }
    }

    pub async fn write(&self, points: Vec<DataPoint>) -> Result<(), StorageError> {
        Ok(self
            .client
            .write(self.bucket.as_str(), stream::iter(points))
            .await?)
    }
}

/// One `water_usage` point per sensor that has a state.
pub fn usage_points(host: &str, data: &CoordinatorData) -> Result<Vec<DataPoint>, StorageError> {
    data.sensors
        .iter()
        .filter_map(|(key, sensor)| WaterUsageMetric::from_sensor(*key, host, sensor))
        .map(|metric| metric.to_point())
        .collect()
}
