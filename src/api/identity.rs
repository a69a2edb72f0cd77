//! Requester identity from gateway headers
//!
//! The chat gateway resolves who sent a command and forwards it as:
//! - `x-player-id`: stable player id (required)
//! - `x-player-name`: display name (optional)

use axum::{extract::FromRequestParts, http::request::Parts};

use super::AppState;
use crate::error::TrackerError;
use crate::permissions::Requester;

pub const PLAYER_ID_HEADER: &str = "x-player-id";
pub const PLAYER_NAME_HEADER: &str = "x-player-name";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<AppState> for Requester {
    type Rejection = TrackerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = header(parts, PLAYER_ID_HEADER).ok_or_else(|| {
            TrackerError::Unauthorized(format!("missing {} header", PLAYER_ID_HEADER))
        })?;
        let display_name = header(parts, PLAYER_NAME_HEADER).map(str::to_string);
        Ok(state.permissions.requester(id, display_name))
    }
}
