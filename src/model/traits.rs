use crate::error::{PortalError, StorageError};
use async_trait::async_trait;
use influxdb2::models::DataPoint;

use super::types::UsageRecord;

/// Trait for types that can be converted to InfluxDB data points.
///
/// Implementors must be thread-safe (Send + Sync) so that points can be
/// produced from the coordinator's shared data.
pub trait DataPointBuilder: Send + Sync {
    /// Converts the metric into an InfluxDB DataPoint.
    ///
    /// # Returns
    /// - `Ok(DataPoint)` if conversion succeeds
    /// - `Err` if the metric data cannot be converted to a valid DataPoint
    fn to_point(&self) -> Result<DataPoint, StorageError>;
}

/// Trait for types that can fetch the hourly usage series.
///
/// The WaterSmart client is the production implementor; the coordinator and
/// the history service only depend on this seam.
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Fetches the hourly series, switching to `meter_id` first when given.
    async fn get_hourly_data(
        &self,
        meter_id: Option<&str>,
    ) -> Result<Vec<UsageRecord>, PortalError>;
}
