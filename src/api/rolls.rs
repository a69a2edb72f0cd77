//! Roll and round endpoints

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{AppState, Scalar};
use crate::combat::{
    ActionKind, DieSize, PenaltyChoice, PenaltyState, ResolvedRoll, RollFlow, RollOutcome,
    RollRequest,
};
use crate::error::TrackerError;
use crate::permissions::Requester;

/// Build roll router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/roll/attack", post(attack))
        .route("/roll/attack/resume", post(resume_attack))
        .route("/roll/cast", post(cast))
        .route("/roll/check", post(check))
        .route("/round/next", post(next_round))
        .route("/penalties/{id}", get(penalties))
        .route("/penalties/{id}/reset", post(reset_penalties))
}

/// Attack or cast request
#[derive(Debug, Deserialize)]
pub struct RollBody {
    pub die1: Scalar,
    pub die2: Scalar,
    #[serde(default)]
    pub modifier: i64,
    /// Penalty chosen up front
    #[serde(default)]
    pub penalty: Option<String>,
}

impl RollBody {
    fn into_request(self) -> Result<RollRequest, TrackerError> {
        Ok(RollRequest {
            die1: self.die1.parse()?,
            die2: self.die2.parse()?,
            modifier: self.modifier,
            choice: self.penalty.as_deref().map(str::parse).transpose()?,
        })
    }
}

async fn attack(
    State(state): State<AppState>,
    requester: Requester,
    Json(body): Json<RollBody>,
) -> Result<Json<RollFlow>, TrackerError> {
    let req = body.into_request()?;
    Ok(Json(state.tracker.attack(&requester, req).await))
}

/// Answer to a penalty prompt
#[derive(Debug, Deserialize)]
pub struct ResumeBody {
    pub token: String,
    pub penalty: String,
}

async fn resume_attack(
    State(state): State<AppState>,
    requester: Requester,
    Json(body): Json<ResumeBody>,
) -> Result<Json<RollFlow>, TrackerError> {
    let choice: PenaltyChoice = body.penalty.parse()?;
    let roll = state
        .tracker
        .resume_attack(&requester, &body.token, choice)
        .await?;
    Ok(Json(RollFlow::Resolved(roll)))
}

async fn cast(
    State(state): State<AppState>,
    requester: Requester,
    Json(body): Json<RollBody>,
) -> Result<Json<ResolvedRoll>, TrackerError> {
    let req = body.into_request()?;
    Ok(Json(state.tracker.cast(&requester, req).await))
}

/// Skill check request
#[derive(Debug, Deserialize)]
pub struct CheckBody {
    pub die1: Scalar,
    pub die2: Scalar,
    pub gate: u32,
}

async fn check(
    State(state): State<AppState>,
    _requester: Requester,
    Json(body): Json<CheckBody>,
) -> Result<Json<RollOutcome>, TrackerError> {
    let die1: DieSize = body.die1.parse()?;
    let die2: DieSize = body.die2.parse()?;
    Ok(Json(state.tracker.check(die1, die2, body.gate).await))
}

#[derive(Debug, Serialize)]
pub struct NextRoundResponse {
    pub cleared: usize,
}

async fn next_round(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<NextRoundResponse>, TrackerError> {
    let cleared = state.tracker.next_round(&requester).await?;
    Ok(Json(NextRoundResponse { cleared }))
}

#[derive(Debug, Serialize)]
pub struct PenaltiesResponse {
    pub attack: PenaltyState,
    pub cast: PenaltyState,
}

async fn penalties(State(state): State<AppState>, Path(id): Path<String>) -> Json<PenaltiesResponse> {
    Json(PenaltiesResponse {
        attack: state.tracker.penalties(&id, ActionKind::Attack),
        cast: state.tracker.penalties(&id, ActionKind::Cast),
    })
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub cleared: bool,
}

async fn reset_penalties(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<String>,
    Query(query): Query<ResetQuery>,
) -> Result<Json<ResetResponse>, TrackerError> {
    let kind: Option<ActionKind> = query.kind.as_deref().map(str::parse).transpose()?;
    let cleared = state.tracker.reset_penalties(&requester, &id, kind).await?;
    Ok(Json(ResetResponse { cleared }))
}
