//! Character sheet endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{AppState, Scalar};
use crate::error::TrackerError;
use crate::permissions::Requester;
use crate::resources::{Amount, Maxima, PlayerRecord, ResourceChange, ResourceKind, TurnReport};

/// Build sheet router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/players", get(list_players))
        .route("/players/{id}", get(get_player).delete(delete_player))
        .route("/players/{id}/stats", put(set_stats))
        .route("/players/{id}/adjust", post(adjust))
        .route("/players/{id}/rest", post(rest))
        .route("/players/{id}/status", put(set_status))
        .route("/players/{id}/status/{name}", delete(remove_status))
        .route("/players/{id}/turn", post(advance_turn))
        .route("/rest-all", post(rest_all))
}

async fn list_players(State(state): State<AppState>) -> Json<Vec<PlayerRecord>> {
    Json(state.tracker.players().await)
}

async fn get_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlayerRecord>, TrackerError> {
    state.tracker.player(&id).await.map(Json)
}

async fn delete_player(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<Json<PlayerRecord>, TrackerError> {
    state.tracker.delete_player(&requester, &id).await.map(Json)
}

/// Set stats request
#[derive(Debug, Deserialize)]
pub struct SetStatsRequest {
    pub character_name: String,
    #[serde(flatten)]
    pub maxima: Maxima,
}

async fn set_stats(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<String>,
    Json(req): Json<SetStatsRequest>,
) -> Result<Json<PlayerRecord>, TrackerError> {
    state
        .tracker
        .set_stats(&requester, &id, &req.character_name, req.maxima)
        .await
        .map(Json)
}

/// Adjust request: `amount` is a signed integer, "full" or "zero"
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub kind: String,
    pub amount: Scalar,
}

async fn adjust(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<String>,
    Json(req): Json<AdjustRequest>,
) -> Result<Json<ResourceChange>, TrackerError> {
    let kind: ResourceKind = req.kind.parse()?;
    let amount: Amount = req.amount.parse()?;
    state.tracker.adjust(&requester, &id, kind, amount).await.map(Json)
}

async fn rest(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<Json<Vec<ResourceChange>>, TrackerError> {
    state.tracker.rest(&requester, &id).await.map(Json)
}

#[derive(Debug, Serialize)]
pub struct RestAllResponse {
    pub rested: usize,
}

async fn rest_all(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<RestAllResponse>, TrackerError> {
    let rested = state.tracker.rest_all(&requester).await?;
    Ok(Json(RestAllResponse { rested }))
}

/// Status request
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub name: String,
    pub duration: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub duration: i64,
    /// True when an existing status had its duration replaced
    pub updated: bool,
}

async fn set_status(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, TrackerError> {
    let updated = state
        .tracker
        .set_status(&requester, &id, &req.name, req.duration)
        .await?;
    Ok(Json(StatusResponse {
        name: req.name,
        duration: req.duration,
        updated,
    }))
}

async fn remove_status(
    State(state): State<AppState>,
    requester: Requester,
    Path((id, name)): Path<(String, String)>,
) -> Result<StatusCode, TrackerError> {
    state.tracker.remove_status(&requester, &id, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn advance_turn(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<Json<TurnReport>, TrackerError> {
    state.tracker.advance_turn(&requester, &id).await.map(Json)
}
