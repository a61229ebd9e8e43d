//! CSV relay: fetch an extract from a URL and drop it into the source
//! namespace, where the next pipeline run will discover it.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::state::AppState;

const FALLBACK_OBJECT_NAME: &str = "uploaded.csv";

#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    pub csv_url: String,
}

#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub message: String,
    pub object_name: String,
    pub namespace: String,
}

pub async fn relay_csv(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RelayRequest>,
) -> Result<Json<RelayResponse>, (StatusCode, String)> {
    let url = Url::parse(&request.csv_url)
        .map_err(|err| (StatusCode::BAD_REQUEST, format!("invalid csv_url: {err}")))?;

    let response = state
        .http
        .get(url.clone())
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|err| {
            (
                StatusCode::BAD_GATEWAY,
                format!("failed to download CSV from URL: {err}"),
            )
        })?;

    let body = response.bytes().await.map_err(|err| {
        (
            StatusCode::BAD_GATEWAY,
            format!("failed to read CSV body: {err}"),
        )
    })?;
    if body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "downloaded CSV is empty".to_string()));
    }

    let object_name = object_name_from_url(&url);
    state
        .store
        .write(&state.relay_namespace, &object_name, body, "text/csv")
        .await
        .map_err(|err| {
            tracing::error!("relay upload failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to store CSV: {err}"),
            )
        })?;

    Ok(Json(RelayResponse {
        message: "CSV relayed successfully.".to_string(),
        object_name,
        namespace: state.relay_namespace.clone(),
    }))
}

/// Last non-empty path segment of the URL, or a fixed fallback when the
/// path carries no usable name.
fn object_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| {
            segments
                .filter(|segment| !segment.is_empty())
                .last()
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_OBJECT_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_is_last_path_segment() {
        let url = Url::parse("https://host/path/data/track_202501010900.csv").unwrap();
        assert_eq!(object_name_from_url(&url), "track_202501010900.csv");
    }

    #[test]
    fn trailing_slash_falls_back_to_previous_segment() {
        let url = Url::parse("https://host/exports/").unwrap();
        assert_eq!(object_name_from_url(&url), "exports");
    }

    #[test]
    fn bare_host_uses_fallback_name() {
        let url = Url::parse("https://host/").unwrap();
        assert_eq!(object_name_from_url(&url), FALLBACK_OBJECT_NAME);
    }
}
