//! Mock implementations and server helpers for testing.
//!
//! This module provides mockito mocks for the WaterSmart portal, a wiremock
//! builder for InfluxDB and a scripted [`UsageSource`].

use crate::error::PortalError;
use crate::model::{UsageRecord, UsageSource};
use async_trait::async_trait;
use mockito::{Matcher, Mock, ServerGuard};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock as WireMock, MockServer, ResponseTemplate};

/// Unregistered mock of the login form post answering with `body`.
///
/// Callers add body matchers or expectations, then call `create_async`.
pub fn mock_login(server: &mut ServerGuard, body: String) -> Mock {
    server
        .mock("POST", "/index.php/welcome/login")
        .match_query(Matcher::UrlEncoded("forceEmail".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "text/html; charset=UTF-8")
        .with_body(body)
}

/// Unregistered mock of the realtime chart endpoint answering with `body`.
pub fn mock_realtime_chart(server: &mut ServerGuard, body: String) -> Mock {
    server
        .mock("GET", "/index.php/rest/v1/Chart/RealTimeChart")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
}

/// Builder for creating wiremock server mocks for InfluxDB endpoints.
pub struct MockInfluxServerBuilder {
    server: MockServer,
}

impl MockInfluxServerBuilder {
    /// Creates a new mock InfluxDB server builder.
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Mocks a write response with expectations.
    pub async fn mock_write_with_expectation(self, times: u64) -> Self {
        WireMock::given(method("POST"))
            .and(path("/api/v2/write"))
            .respond_with(ResponseTemplate::new(204))
            .expect(times)
            .mount(&self.server)
            .await;
        self
    }

    /// Mocks a write error response.
    pub async fn mock_write_error(self, status: u16, message: &str) -> Self {
        WireMock::given(method("POST"))
            .and(path("/api/v2/write"))
            .respond_with(ResponseTemplate::new(status).set_body_string(message))
            .mount(&self.server)
            .await;
        self
    }

    /// Builds and returns the configured mock server.
    pub fn build(self) -> MockServer {
        self.server
    }
}

/// Usage source replaying scripted results.
///
/// Queued results are served first, in order; once the queue is drained
/// every call returns a copy of the fallback records.
pub struct MockUsageSource {
    queued: Mutex<VecDeque<Result<Vec<UsageRecord>, PortalError>>>,
    fallback: Vec<UsageRecord>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Option<String>>>,
}

impl MockUsageSource {
    /// Creates a source that always returns `records`.
    pub fn new(records: Vec<UsageRecord>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: records,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues a result served before the fallback.
    pub fn then(self, result: Result<Vec<UsageRecord>, PortalError>) -> Self {
        self.queued.lock().unwrap().push_back(result);
        self
    }

    /// Delays every response, for exercising timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Meter ids requested so far, one entry per call.
    pub fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UsageSource for MockUsageSource {
    async fn get_hourly_data(
        &self,
        meter_id: Option<&str>,
    ) -> Result<Vec<UsageRecord>, PortalError> {
        self.calls
            .lock()
            .unwrap()
            .push(meter_id.map(str::to_string));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self.queued.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::hourly_records;

    #[tokio::test]
    async fn test_mock_usage_source_serves_queue_then_fallback() {
        let source = MockUsageSource::new(hourly_records())
            .then(Err(PortalError::UnknownMeter("x".to_string())));

        assert!(source.get_hourly_data(None).await.is_err());
        assert_eq!(source.get_hourly_data(Some("m")).await.unwrap().len(), 4);
        assert_eq!(source.calls(), vec![None, Some("m".to_string())]);
    }

    #[tokio::test]
    async fn test_mock_influx_server_builder() {
        let server = MockInfluxServerBuilder::new()
            .await
            .mock_write_with_expectation(0)
            .await
            .build();

        assert!(server.uri().starts_with("http://"));
    }
}
