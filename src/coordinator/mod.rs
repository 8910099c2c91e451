//! Periodic fetch of the hourly series and derivation of sensor data.
//!
//! A [`Coordinator`] owns the latest [`CoordinatorData`] of one account. A
//! successful refresh replaces it as a whole; a failed refresh keeps the
//! previous snapshot and only marks the coordinator unavailable.

mod converters;

pub use converters::DATA_CONVERTERS;

use crate::error::CoordinatorError;
use crate::model::{SensorData, SensorKey, UsageRecord, UsageSource};
use chrono_tz::Tz;
use serde_derive::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::{timeout, Duration};

/// Result of one successful refresh: the raw series and one entry per converter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorData {
    pub hourly: Vec<UsageRecord>,
    #[serde(flatten)]
    pub sensors: BTreeMap<SensorKey, SensorData>,
}

impl CoordinatorData {
    /// Runs every registered converter over `hourly`.
    pub fn from_hourly(hourly: Vec<UsageRecord>, tz: Tz) -> Self {
        let sensors = DATA_CONVERTERS
            .iter()
            .map(|(key, convert)| (*key, convert(&hourly, tz)))
            .collect();
        Self { hourly, sensors }
    }

    pub fn sensor(&self, key: SensorKey) -> Option<&SensorData> {
        self.sensors.get(&key)
    }
}

#[derive(Debug, Default)]
struct CoordinatorState {
    data: Option<Arc<CoordinatorData>>,
    last_update_success: bool,
    last_error: Option<String>,
}

pub struct Coordinator {
    source: Arc<dyn UsageSource>,
    name: String,
    meter_id: Option<String>,
    tz: Tz,
    fetch_timeout: Duration,
    state: RwLock<CoordinatorState>,
}

impl Coordinator {
    pub fn new(
        source: Arc<dyn UsageSource>,
        name: impl Into<String>,
        tz: Tz,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            name: name.into(),
            meter_id: None,
            tz,
            fetch_timeout,
            state: RwLock::new(CoordinatorState::default()),
        }
    }

    /// Polls `meter_id` instead of the portal's active meter.
    pub fn with_meter_id(mut self, meter_id: Option<String>) -> Self {
        self.meter_id = meter_id.filter(|id| !id.is_empty());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meter_id(&self) -> Option<&str> {
        self.meter_id.as_deref()
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    /// Latest successful snapshot, kept across failed refreshes.
    pub fn data(&self) -> Option<Arc<CoordinatorData>> {
        self.read_state().data.clone()
    }

    /// True while the most recent refresh succeeded.
    pub fn is_available(&self) -> bool {
        let state = self.read_state();
        state.last_update_success && state.data.is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        self.read_state().last_error.clone()
    }

    /// Fetches the series and replaces the snapshot.
    ///
    /// On failure the previous snapshot stays in place and the coordinator is
    /// marked unavailable until the next successful refresh.
    pub async fn refresh(&self) -> Result<Arc<CoordinatorData>, CoordinatorError> {
        match self.fetch(self.meter_id.as_deref()).await {
            Ok(hourly) => {
                let data = Arc::new(CoordinatorData::from_hourly(hourly, self.tz));
                let mut state = self.write_state();
                state.data = Some(Arc::clone(&data));
                state.last_update_success = true;
                state.last_error = None;
                tracing::debug!(name = %self.name, records = data.hourly.len(), "Update complete");
                Ok(data)
            }
            Err(e) => {
                tracing::error!(name = %self.name, error = %e, "Error fetching data");
                let mut state = self.write_state();
                state.last_update_success = false;
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetches the series of another meter without touching the snapshot.
    pub async fn fetch_for_meter(
        &self,
        meter_id: &str,
    ) -> Result<Vec<UsageRecord>, CoordinatorError> {
        self.fetch(Some(meter_id)).await
    }

    async fn fetch(&self, meter_id: Option<&str>) -> Result<Vec<UsageRecord>, CoordinatorError> {
        match timeout(self.fetch_timeout, self.source.get_hourly_data(meter_id)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CoordinatorError::timeout(
                &self.name,
                self.fetch_timeout.as_secs(),
            )),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CoordinatorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CoordinatorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
