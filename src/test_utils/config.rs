//! Configuration utilities for testing.
//!
//! This module provides test configuration builders and helpers for creating
//! mock configurations used throughout the test suite.

use crate::config::{InfluxConfig, WaterSmartConfig};

/// Builder for creating test WaterSmart configurations.
#[derive(Debug)]
pub struct TestWaterSmartConfigBuilder {
    host: String,
    username: String,
    password: String,
    base_url: Option<String>,
    meter_id: Option<String>,
}

impl TestWaterSmartConfigBuilder {
    /// Creates a new test config builder with default values.
    pub fn new() -> Self {
        Self {
            host: "test".to_string(),
            username: "test@home-assistant.io".to_string(),
            password: "Passw0rd".to_string(),
            base_url: None,
            meter_id: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Points the client at a mock server instead of the public portal.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_meter_id(mut self, meter_id: impl Into<String>) -> Self {
        self.meter_id = Some(meter_id.into());
        self
    }

    /// Builds the WaterSmart configuration.
    pub fn build(self) -> WaterSmartConfig {
        WaterSmartConfig {
            host: self.host,
            username: self.username,
            password: self.password,
            base_url: self.base_url,
            meter_id: self.meter_id,
        }
    }
}

/// Builder for creating test InfluxDB configurations.
#[derive(Debug)]
pub struct TestInfluxConfigBuilder {
    url: String,
    org: String,
    token: String,
    bucket: String,
}

impl TestInfluxConfigBuilder {
    /// Creates a new test config builder with default values.
    pub fn new() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            org: "test-org".to_string(),
            token: "test-token".to_string(),
            bucket: "test-bucket".to_string(),
        }
    }

    /// Sets the URL for the test configuration.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Builds the InfluxDB configuration.
    pub fn build(self) -> InfluxConfig {
        InfluxConfig {
            url: self.url,
            org: self.org,
            token: self.token,
            bucket: self.bucket,
        }
    }
}

/// Creates a default test WaterSmart configuration.
pub fn test_watersmart_config() -> WaterSmartConfig {
    TestWaterSmartConfigBuilder::new().build()
}

/// Creates a test WaterSmart configuration served by a mock server.
pub fn test_watersmart_config_with_url(url: impl Into<String>) -> WaterSmartConfig {
    TestWaterSmartConfigBuilder::new().with_base_url(url).build()
}

/// Creates a test InfluxDB configuration with a custom URL.
/// This is a convenience function for tests that need to specify a mock server URL.
pub fn test_influx_config_with_url(url: impl Into<String>) -> InfluxConfig {
    TestInfluxConfigBuilder::new().with_url(url).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watersmart_config_builder() {
        let config = TestWaterSmartConfigBuilder::new()
            .with_host("bendoregon")
            .with_username("user@example.com")
            .with_base_url("http://mock.local")
            .with_meter_id("13089_11499")
            .build();

        assert_eq!(config.host, "bendoregon");
        assert_eq!(config.username, "user@example.com");
        assert_eq!(config.password, "Passw0rd");
        assert_eq!(config.base_url.as_deref(), Some("http://mock.local"));
        assert_eq!(config.meter_id.as_deref(), Some("13089_11499"));
    }

    #[test]
    fn test_convenience_functions() {
        assert_eq!(test_watersmart_config().base_url, None);
        assert_eq!(
            test_watersmart_config_with_url("http://mock.local").base_url.as_deref(),
            Some("http://mock.local")
        );
        assert_eq!(
            test_influx_config_with_url("http://mock:8086").url,
            "http://mock:8086"
        );
    }
}
