use crate::error::ConfigError;
use chrono_tz::Tz;
use serde_derive::Deserialize;
use std::fmt;
use std::str::FromStr;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_port() -> u16 {
    8099
}

#[derive(Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.as_str()).unwrap_or(tracing::Level::INFO)
    }
}

pub(crate) fn load_app_config() -> Result<AppConfig, ConfigError> {
    envy::from_env::<AppConfig>().map_err(ConfigError::env_parse)
}

fn default_scan_interval_sec() -> u64 {
    60 * 60
}

fn default_fetch_timeout_sec() -> u64 {
    30
}

fn default_task_timeout_sec() -> u64 {
    120
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

#[derive(Deserialize, Debug)]
pub struct CollectorConfig {
    #[serde(default = "default_scan_interval_sec")]
    pub scan_interval_sec: u64,
    #[serde(default = "default_fetch_timeout_sec")]
    pub fetch_timeout_sec: u64,
    // bounds a whole poll cycle, fetch plus InfluxDB write
    #[serde(default = "default_task_timeout_sec")]
    pub task_timeout_sec: u64,
    // IANA name; portal timestamps are relabeled into this zone
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl CollectorConfig {
    pub fn time_zone(&self) -> Result<Tz, ConfigError> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|e| ConfigError::invalid("time_zone", e.to_string()))
    }
}

pub fn load_collector_config() -> Result<CollectorConfig, ConfigError> {
    envy::prefixed("COLLECTOR_")
        .from_env::<CollectorConfig>()
        .map_err(ConfigError::env_parse)
}

#[derive(Deserialize, Clone)]
pub struct WaterSmartConfig {
    /// Bare subdomain, FQDN or https URL of the utility portal.
    pub host: String,
    pub username: String,
    pub password: String,
    /// Overrides the `https://{hostname}.{domain}` portal address.
    pub base_url: Option<String>,
    /// Meter polled by the coordinator; the portal's active meter when unset.
    pub meter_id: Option<String>,
}

impl fmt::Debug for WaterSmartConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaterSmartConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"**REDACTED**")
            .field("base_url", &self.base_url)
            .field("meter_id", &self.meter_id)
            .finish()
    }
}

pub(crate) fn load_watersmart_config() -> Result<WaterSmartConfig, ConfigError> {
    envy::prefixed("WATERSMART_")
        .from_env::<WaterSmartConfig>()
        .map_err(ConfigError::env_parse)
}

#[derive(Deserialize, Debug)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

/// Loads the InfluxDB target, or `None` when forwarding is not configured.
pub fn load_influx_config() -> Result<Option<InfluxConfig>, ConfigError> {
    if std::env::var_os("INFLUXDB_URL").is_none() {
        return Ok(None);
    }
    envy::prefixed("INFLUXDB_")
        .from_env::<InfluxConfig>()
        .map(Some)
        .map_err(ConfigError::env_parse)
}
