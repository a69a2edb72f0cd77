//! HTTP API module - command dispatcher for chat gateways
//!
//! Each route maps one bot command onto the tracker and answers with
//! structured JSON; rendering messages is left to the gateway.

mod encounter;
mod error;
mod identity;
mod players;
mod rolls;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::db::Database;
use crate::error::TrackerError;
use crate::permissions::PermissionManager;
use crate::tracker::Tracker;

pub use error::ErrorResponse;
pub use identity::{PLAYER_ID_HEADER, PLAYER_NAME_HEADER};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
    pub permissions: Arc<PermissionManager>,
    /// Present when state lives in SQLite
    pub db: Option<Arc<Database>>,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .merge(players::router())
        .merge(encounter::router())
        .merge(rolls::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A number or a string in a request body, e.g. `8` or `"d8"`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    /// Parse through `FromStr`, accepting numbers as their decimal text
    pub(crate) fn parse<T>(&self) -> Result<T, TrackerError>
    where
        T: std::str::FromStr<Err = TrackerError>,
    {
        match self {
            Scalar::Int(n) => n.to_string().parse(),
            Scalar::Text(s) => s.parse(),
        }
    }
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "clashd",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let Some(db) = state.db else {
        return (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "none",
            }),
        );
    };

    match db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                database: "error",
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}
