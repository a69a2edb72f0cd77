//! Access control
//!
//! Two access levels:
//! - Player: may manage their own sheet and roll for themselves
//! - Gm: may also run encounters, advance rounds, reset penalties and edit
//!   any player's sheet
//!
//! Which ids are GMs comes from configuration; identity itself is resolved by
//! the gateway in front of the tracker.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};

/// Access levels at the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Player,
    Gm,
}

impl AccessLevel {
    /// Check if this level may run GM-only operations
    pub fn is_gm(&self) -> bool {
        *self >= AccessLevel::Gm
    }
}

/// Operations reserved for the GM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GmAction {
    RestAll,
    StartEncounter,
    EndEncounter,
    AdvanceRound,
    ResetPenalty,
    EditOtherSheet,
}

impl fmt::Display for GmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GmAction::RestAll => "rest everyone",
            GmAction::StartEncounter => "start an encounter",
            GmAction::EndEncounter => "end an encounter",
            GmAction::AdvanceRound => "advance the round",
            GmAction::ResetPenalty => "reset penalties",
            GmAction::EditOtherSheet => "edit another player's sheet",
        };
        write!(f, "{}", s)
    }
}

/// Who is acting on a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: String,
    pub display_name: Option<String>,
    pub level: AccessLevel,
}

impl Requester {
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Fail unless the requester is a GM
    pub fn require_gm(&self, action: GmAction) -> TrackerResult<()> {
        if self.level.is_gm() {
            Ok(())
        } else {
            Err(TrackerError::Unauthorized(format!(
                "only the GM may {}",
                action
            )))
        }
    }

    /// Fail unless the requester owns the sheet or is a GM
    pub fn require_owner_or_gm(&self, player_id: &str) -> TrackerResult<()> {
        if self.id == player_id {
            Ok(())
        } else {
            self.require_gm(GmAction::EditOtherSheet)
        }
    }

    /// Display name to store when touching `player_id`'s sheet
    pub fn name_for(&self, player_id: &str) -> Option<&str> {
        if self.id == player_id {
            self.display_name()
        } else {
            None
        }
    }
}

/// Permission manager holding the GM roster
#[derive(Debug, Default)]
pub struct PermissionManager {
    gms: HashSet<String>,
}

impl PermissionManager {
    pub fn new<I, S>(gm_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            gms: gm_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Access level for a player id
    pub fn level(&self, player_id: &str) -> AccessLevel {
        if self.gms.contains(player_id) {
            AccessLevel::Gm
        } else {
            AccessLevel::Player
        }
    }

    /// Build a requester for an already-resolved identity
    pub fn requester(&self, player_id: &str, display_name: Option<String>) -> Requester {
        Requester {
            id: player_id.to_string(),
            display_name,
            level: self.level(player_id),
        }
    }
}
