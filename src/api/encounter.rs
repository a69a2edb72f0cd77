//! Encounter (clash) endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::encounter::{RosterChange, RosterView};
use crate::error::TrackerError;
use crate::permissions::Requester;

/// Build encounter router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/encounter", get(list))
        .route("/encounter/start", post(start))
        .route("/encounter/end", post(end))
        .route(
            "/encounter/combatants",
            post(add_combatants).delete(remove_combatants),
        )
}

#[derive(Debug, Serialize)]
pub struct EncounterStatus {
    pub active: bool,
}

/// Combatant ids to add or remove
#[derive(Debug, Deserialize)]
pub struct CombatantsRequest {
    pub ids: Vec<String>,
}

async fn list(State(state): State<AppState>) -> Json<RosterView> {
    Json(state.tracker.encounter().await)
}

async fn start(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<EncounterStatus>, TrackerError> {
    state.tracker.start_encounter(&requester).await?;
    Ok(Json(EncounterStatus { active: true }))
}

async fn end(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<EncounterStatus>, TrackerError> {
    state.tracker.end_encounter(&requester).await?;
    Ok(Json(EncounterStatus { active: false }))
}

async fn add_combatants(
    State(state): State<AppState>,
    _requester: Requester,
    Json(req): Json<CombatantsRequest>,
) -> Result<Json<RosterChange>, TrackerError> {
    state.tracker.add_combatants(&req.ids).await.map(Json)
}

async fn remove_combatants(
    State(state): State<AppState>,
    _requester: Requester,
    Json(req): Json<CombatantsRequest>,
) -> Result<Json<RosterChange>, TrackerError> {
    state.tracker.remove_combatants(&req.ids).await.map(Json)
}
