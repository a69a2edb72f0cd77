//! Player resource sheets
//!
//! Each player carries five resource pools:
//! - HP, MP, IP, Armor, Barrier (each a current/max pair)
//! - An ordered list of named status effects with turn durations
//!
//! Arithmetic on `current` is unclamped unless the clamp policy is enabled.

mod effects;
mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

pub use effects::{StatusEffect, StatusEffects, TurnReport};
pub use store::{ResourceChange, ResourceStore};

/// The five tracked resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Hp,
    Mp,
    Ip,
    Armor,
    Barrier,
}

impl ResourceKind {
    /// All kinds in sheet order
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Hp,
        ResourceKind::Mp,
        ResourceKind::Ip,
        ResourceKind::Armor,
        ResourceKind::Barrier,
    ];

    /// Whether a rest refills this resource
    pub fn restored_by_rest(&self) -> bool {
        !matches!(self, ResourceKind::Ip)
    }
}

impl FromStr for ResourceKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hp" | "health" => Ok(ResourceKind::Hp),
            "mp" | "mana" => Ok(ResourceKind::Mp),
            "ip" => Ok(ResourceKind::Ip),
            "armor" | "armour" => Ok(ResourceKind::Armor),
            "barrier" => Ok(ResourceKind::Barrier),
            other => Err(TrackerError::InvalidInput(format!(
                "unknown resource kind: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Hp => "HP",
            ResourceKind::Mp => "MP",
            ResourceKind::Ip => "IP",
            ResourceKind::Armor => "Armor",
            ResourceKind::Barrier => "Barrier",
        };
        write!(f, "{}", s)
    }
}

/// A current/max pair for one resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePair {
    pub current: i64,
    pub max: i64,
}

impl ResourcePair {
    pub fn new(current: i64, max: i64) -> Self {
        Self { current, max }
    }
}

/// Maxima supplied by the "set" operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maxima {
    pub hp: i64,
    pub mp: i64,
    pub ip: i64,
    pub armor: i64,
    pub barrier: i64,
}

impl Maxima {
    /// Look up the maximum for a kind
    pub fn get(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Hp => self.hp,
            ResourceKind::Mp => self.mp,
            ResourceKind::Ip => self.ip,
            ResourceKind::Armor => self.armor,
            ResourceKind::Barrier => self.barrier,
        }
    }
}

/// Amount accepted by a resource adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    /// Signed delta added to current
    Delta(i64),
    /// Set current to max
    Full,
    /// Set current to zero
    Zero,
}

impl FromStr for Amount {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "full" | "max" => Ok(Amount::Full),
            "zero" => Ok(Amount::Zero),
            _ => s.parse::<i64>().map(Amount::Delta).map_err(|_| {
                TrackerError::InvalidInput(format!(
                    "invalid amount '{}': expected an integer, 'full' or 'zero'",
                    s
                ))
            }),
        }
    }
}

/// Persistent sheet for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub character_name: String,
    #[serde(default)]
    pub hp: ResourcePair,
    #[serde(default)]
    pub mp: ResourcePair,
    #[serde(default)]
    pub ip: ResourcePair,
    #[serde(default)]
    pub armor: ResourcePair,
    #[serde(default)]
    pub barrier: ResourcePair,
    #[serde(default)]
    pub statuses: StatusEffects,
}

impl PlayerRecord {
    /// Fresh sheet with every value zero
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            character_name: String::new(),
            hp: ResourcePair::default(),
            mp: ResourcePair::default(),
            ip: ResourcePair::default(),
            armor: ResourcePair::default(),
            barrier: ResourcePair::default(),
            statuses: StatusEffects::default(),
        }
    }

    /// Resource pair for a kind
    pub fn resource(&self, kind: ResourceKind) -> &ResourcePair {
        match kind {
            ResourceKind::Hp => &self.hp,
            ResourceKind::Mp => &self.mp,
            ResourceKind::Ip => &self.ip,
            ResourceKind::Armor => &self.armor,
            ResourceKind::Barrier => &self.barrier,
        }
    }

    /// Mutable resource pair for a kind
    pub fn resource_mut(&mut self, kind: ResourceKind) -> &mut ResourcePair {
        match kind {
            ResourceKind::Hp => &mut self.hp,
            ResourceKind::Mp => &mut self.mp,
            ResourceKind::Ip => &mut self.ip,
            ResourceKind::Armor => &mut self.armor,
            ResourceKind::Barrier => &mut self.barrier,
        }
    }

    /// Name to show for this player: character name if set, else display name
    pub fn label(&self) -> &str {
        if self.character_name.is_empty() {
            &self.display_name
        } else {
            &self.character_name
        }
    }
}
