//! HTTP API exposing sensors, the history query and diagnostics.

use crate::diagnostics::entry_diagnostics;
use crate::entry::EntryRegistry;
use crate::error::ServiceError;
use crate::sensor::{sensor_states, SensorState};
use crate::service::{get_hourly_history, HourlyHistoryRequest, HourlyHistoryResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub entries: Arc<EntryRegistry>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sensors", get(sensors))
        .route("/api/services/get_hourly_history", post(hourly_history))
        .route("/api/diagnostics", get(diagnostics))
        .with_state(state)
}

/// Binds `0.0.0.0:{port}` and serves the API until the task is dropped.
pub async fn serve(port: u16, state: ApiState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::Source(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn sensors(State(state): State<ApiState>) -> Json<Vec<SensorState>> {
    Json(state.entries.iter().flat_map(sensor_states).collect())
}

async fn hourly_history(
    State(state): State<ApiState>,
    Json(request): Json<HourlyHistoryRequest>,
) -> Result<Json<HourlyHistoryResponse>, ServiceError> {
    get_hourly_history(&state.entries, &request).await.map(Json)
}

async fn diagnostics(
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut by_entry = Map::new();
    for loaded in state.entries.iter() {
        let value = entry_diagnostics(loaded).map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;
        by_entry.insert(loaded.entry.entry_id.clone(), value);
    }
    Ok(Json(Value::Object(by_entry)))
}
