//! Scenario Tests for clashd
//!
//! Table play over HTTP:
//! - Sheets: stats, adjustments, rest, statuses
//! - Encounter: roster lifecycle
//! - Rolls: attack prompts, penalties, casts, checks
//! - Permissions: GM-only commands and sheet ownership

pub mod encounter;
pub mod rolls;
pub mod sheets;
