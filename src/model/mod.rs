//! Model definitions for WaterSmart usage data and derived metrics.
//!
//! This module provides the record shapes returned by the portal, the
//! serialized forms exposed to consumers, and the conversion of derived
//! metrics into InfluxDB data points.

pub mod metrics;
pub mod traits;
pub mod types;
pub mod utilities;

// Re-export commonly used items at the module level
pub use metrics::{SensorAttributes, SensorData, WaterUsageMetric};
pub use traits::{DataPointBuilder, UsageSource};
pub use types::{
    MeterInfo, SensorKey, SerializedRecord, Unit, UsageHistoryPayload, UsageRecord,
};
pub use utilities::{from_timestamp, local_isoformat, localize, serialize_records};
