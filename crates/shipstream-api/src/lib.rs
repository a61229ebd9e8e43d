pub mod relay;
pub mod routes;
pub mod state;

use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/runs", post(routes::trigger_run))
        .route("/runs/latest", get(routes::run_status))
        .route("/relay", post(relay::relay_csv))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, port: u16) -> Result<()> {
    let app = router(state);
    let listener = TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
