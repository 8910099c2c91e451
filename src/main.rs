//! WaterSmart to InfluxDB2 Forwarder
//!
//! This application scrapes hourly water usage from a WaterSmart utility
//! portal, derives usage metrics from it and optionally forwards them to
//! InfluxDB2.
//!
//! # Architecture
//!
//! - **Poll task** (1-hour interval by default): refreshes the coordinator
//!   and writes the derived metrics to InfluxDB when configured
//! - **API server**: serves sensor states, the hourly history query and
//!   diagnostics over HTTP
//!
//! # Features
//!
//! - Account and meter validation before the first poll
//! - Automatic restart of the poll task on failure
//! - Graceful shutdown on SIGTERM/SIGINT
//! - Timeout protection for hung poll cycles

mod api;
mod config;
mod coordinator;
mod diagnostics;
mod entry;
mod error;
mod influxdb;
mod model;
mod sensor;
mod service;
mod setup;
mod watersmart;

#[cfg(test)]
mod test_utils;

use crate::coordinator::Coordinator;
use crate::entry::{EntryRegistry, LoadedEntry};
use anyhow::{anyhow, Context};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinError;
use tokio::time;
use tokio::time::{sleep, Duration};

/// Application entry point.
///
/// Loads configuration, validates the account, and manages the main event
/// loop with signal handling for graceful shutdown.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_app_config().context("Failed to load AppConfig")?;
    tracing_subscriber::fmt()
        .with_max_level(app_config.log_level())
        .init();

    let collector_config =
        config::load_collector_config().context("Failed to load CollectorConfig")?;
    let time_zone = collector_config.time_zone()?;
    let fetch_timeout = Duration::from_secs(collector_config.fetch_timeout_sec);

    let influx_client = config::load_influx_config()
        .context("Failed to load InfluxConfig")?
        .map(|influx_config| Arc::new(influxdb::Client::new(influx_config)));
    if influx_client.is_none() {
        tracing::info!("INFLUXDB_URL is not set, metrics will not be forwarded");
    }

    let watersmart_config =
        config::load_watersmart_config().context("Failed to load WaterSmartConfig")?;
    let meter_id = watersmart_config.meter_id.clone();
    let (client, entry) = setup::validate_input(watersmart_config, fetch_timeout)
        .await
        .map_err(|e| anyhow!("Failed to set up WaterSmart account: {}", e.as_str()))?;
    setup::select_meter(&client, meter_id.as_deref())
        .await
        .context("Failed to select WaterSmart meter")?;
    let hostname = client.hostname().to_string();

    let coordinator = Arc::new(
        Coordinator::new(
            Arc::new(client),
            format!("WaterSmart {}", hostname),
            time_zone,
            fetch_timeout,
        )
        .with_meter_id(meter_id),
    );

    let mut entries = EntryRegistry::default();
    entries.insert(LoadedEntry {
        entry,
        hostname: hostname.clone(),
        coordinator: Arc::clone(&coordinator),
    });
    let api_state = api::ApiState {
        entries: Arc::new(entries),
    };

    // Factory for the poll task, so it can be recreated after a failure
    let create_poll_task = || -> tokio::task::JoinHandle<()> {
        tokio::spawn(create_poll_cycle(
            Arc::clone(&coordinator),
            influx_client.clone(),
            hostname.clone(),
            Duration::from_secs(collector_config.scan_interval_sec),
            collector_config.task_timeout_sec,
        ))
    };
    let mut poll_task = create_poll_task();
    let mut api_task = tokio::spawn(api::serve(app_config.api_port, api_state));

    let mut sig_term =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
    tracing::info!("Running... Press Ctrl-C or send SIGTERM to terminate.");
    // Main event loop with signal handling and task supervision
    loop {
        tokio::select! {
            _ = sig_term.recv() => {
                tracing::info!("Received SIGTERM. Exiting...");
                break;
            }
            _ = ctrl_c() => {
                tracing::info!("Received SIGINT. Exiting...");
                break;
            }
            // Monitor the poll task and restart it once a cycle ends
            result = &mut poll_task => {
                handle_task_result("poll", result);
                poll_task = create_poll_task();
            }
            // The API server only returns on failure
            result = &mut api_task => {
                return match result {
                    Ok(Ok(())) => Err(anyhow!("API server stopped")),
                    Ok(Err(e)) => Err(e.context("API server failed")),
                    Err(e) => Err(anyhow!("API server task failed: {:?}", e)),
                };
            }
        }
    }

    Ok(())
}

/// Wraps a future with a timeout to prevent tasks from hanging indefinitely.
///
/// Logs an error if the task times out but doesn't propagate the error.
async fn with_timeout<F>(task_name: &'static str, future: F, timeout_seconds: u64)
where
    F: IntoFuture,
{
    let timeout_duration = Duration::from_secs(timeout_seconds);

    match time::timeout(timeout_duration, future).await {
        Ok(_) => {}
        Err(_) => tracing::error!("Task {} timed out.", task_name),
    }
}

/// Runs a single poll cycle.
///
/// This function:
/// 1. Refreshes the coordinator
/// 2. Writes the derived metrics to InfluxDB, when a client is configured
/// 3. Sleeps for the specified interval
///
/// A failed refresh is already recorded by the coordinator and skips the
/// write; the previous metrics are not written again.
async fn create_poll_cycle(
    coordinator: Arc<Coordinator>,
    influx_client: Option<Arc<influxdb::Client>>,
    host: String,
    interval: Duration,
    timeout_seconds: u64,
) {
    with_timeout(
        "poll",
        async {
            let Ok(data) = coordinator.refresh().await else {
                return;
            };
            let Some(influx_client) = influx_client else {
                return;
            };

            let points = match influxdb::usage_points(&host, &data) {
                Ok(points) => points,
                Err(e) => {
                    tracing::error!("Failed to build points: {:?}", e);
                    return;
                }
            };
            for point in &points {
                tracing::debug!("{:?}", point);
            }

            match influx_client.write(points).await {
                Ok(_) => tracing::info!("Successfully wrote points to InfluxDB ({})", host),
                Err(e) => tracing::error!("Failed to write points to InfluxDB ({}): {:?}", host, e),
            }
        },
        timeout_seconds,
    )
    .await;
    sleep(interval).await;
}

/// Handles the result of a tokio task, logging success or failure.
///
/// - Success is logged at debug level
/// - Failures (panics, cancellation) are logged at error level
fn handle_task_result(task_name: &str, result: Result<(), JoinError>) {
    match result {
        Ok(_) => {
            tracing::debug!("Task {} completed.", task_name);
        }
        Err(e) => {
            tracing::error!("Task {} failed: {:?}", task_name, e);
        }
    }
}
