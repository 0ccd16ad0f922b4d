use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// `ok` when the database answers, `degraded` otherwise.
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = "connected")]
    pub database: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    operation_id = "banner",
    summary = "Service banner",
    responses((status = 200, description = "Plain-text banner", body = String)),
)]
pub async fn banner() -> &'static str {
    "Reviews widget API is running"
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Liveness and database connectivity",
    responses((status = 200, description = "Health report", body = HealthResponse)),
)]
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database ping failed");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "ok" } else { "degraded" },
        database: if connected { "connected" } else { "disconnected" },
        timestamp: Utc::now(),
    })
}
