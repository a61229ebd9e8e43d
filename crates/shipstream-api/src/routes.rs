//! Trigger and status handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::state::{AppState, RunState};

/// Start a pipeline run. While a run is in flight, further triggers are
/// rejected with the in-flight run's state instead of starting a second
/// read-merge-write sequence.
pub async fn trigger_run(State(state): State<Arc<AppState>>) -> Response {
    if let Err(in_flight) = state.coordinator.begin().await {
        return (StatusCode::CONFLICT, Json(in_flight)).into_response();
    }

    match state.pipeline.run().await {
        Ok(outcome) => {
            state.coordinator.complete(outcome.clone()).await;
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(err) => {
            tracing::error!("pipeline run failed: {err}");
            let message = err.to_string();
            state.coordinator.fail(message.clone()).await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "FAILED", "error": message })),
            )
                .into_response()
        }
    }
}

/// Report the most recent run's state.
pub async fn run_status(State(state): State<Arc<AppState>>) -> Json<RunState> {
    Json(state.coordinator.current().await)
}
