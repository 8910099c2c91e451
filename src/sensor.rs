//! Sensor descriptions and the state exposed for each loaded entry.

use crate::entry::LoadedEntry;
use crate::model::{SensorAttributes, SensorKey, Unit};
use serde_derive::Serialize;

pub const MANUFACTURER: &str = "WaterSmart by VertexOne";
pub const ATTRIBUTION: &str = "Data scraped from WaterSmart";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorDescription {
    pub key: SensorKey,
    pub translation_key: &'static str,
    pub name: &'static str,
    pub unit: Unit,
    pub device_class: &'static str,
}

pub const SENSOR_TYPES: [SensorDescription; 2] = [
    SensorDescription {
        key: SensorKey::GallonsForMostRecentHour,
        translation_key: "gallons_for_most_recent_hour",
        name: "Gallons for most recent hour",
        unit: Unit::Gallon,
        device_class: "water",
    },
    SensorDescription {
        key: SensorKey::GallonsForMostRecentFullDay,
        translation_key: "gallons_for_most_recent_full_day",
        name: "Gallons for most recent full day",
        unit: Unit::Gallon,
        device_class: "water",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub manufacturer: &'static str,
    pub name: String,
    pub entry_type: &'static str,
}

pub fn device_info(hostname: &str, username: &str) -> DeviceInfo {
    DeviceInfo {
        identifier: format!("{}-{}", hostname, username),
        manufacturer: MANUFACTURER,
        name: format!("WaterSmart ({})", hostname),
        entry_type: "service",
    }
}

pub fn unique_id(hostname: &str, username: &str, key: SensorKey) -> String {
    format!("{}-{}-{}", hostname, username, key).to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub key: SensorKey,
    pub name: &'static str,
    pub state: Option<f64>,
    pub unit_of_measurement: String,
    pub device_class: &'static str,
    pub available: bool,
    pub attribution: &'static str,
    pub attributes: Option<SensorAttributes>,
    pub device: DeviceInfo,
}

/// Current state of every sensor of `loaded`.
///
/// Values come from the last successful refresh; `available` turns false as
/// soon as a refresh fails.
pub fn sensor_states(loaded: &LoadedEntry) -> Vec<SensorState> {
    let username = &loaded.entry.data.username;
    let data = loaded.coordinator.data();
    let available = loaded.coordinator.is_available();

    SENSOR_TYPES
        .iter()
        .map(|description| {
            let sensor = data.as_ref().and_then(|data| data.sensor(description.key));
            SensorState {
                unique_id: unique_id(&loaded.hostname, username, description.key),
                key: description.key,
                name: description.name,
                state: sensor.and_then(|sensor| sensor.state),
                unit_of_measurement: description.unit.to_string(),
                device_class: description.device_class,
                available,
                attribution: ATTRIBUTION,
                attributes: sensor.map(|sensor| sensor.attrs.clone()),
                device: device_info(&loaded.hostname, username),
            }
        })
        .collect()
}
