//! Suspend/resume persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Terrain travels with the snapshot, so a resumed game lands on the same ground
//! - Consistency checks before a session is rebuilt

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::{ConfigError, Settings};
use crate::sim::{GamePhase, Session, SessionSnapshot, TerrainError, TerrainProfile};

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

/// Failure to read or apply a save
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("saved terrain is invalid: {0}")]
    Terrain(#[from] TerrainError),
    #[error("save does not match its terrain: {0}")]
    Inconsistent(&'static str),
    #[error("saved session cannot run: {0}")]
    Config(#[from] ConfigError),
}

/// Everything needed to resume a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    pub snapshot: SessionSnapshot,
    pub terrain: TerrainProfile,
}

impl SaveEnvelope {
    /// Capture a running session
    pub fn capture(session: &Session) -> Self {
        Self {
            version: SAVE_VERSION,
            snapshot: session.snapshot(),
            terrain: session.terrain().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and check a save
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let envelope: SaveEnvelope = serde_json::from_str(json)?;
        if envelope.version != SAVE_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: envelope.version,
                expected: SAVE_VERSION,
            });
        }
        envelope.terrain.validate()?;
        envelope.check_snapshot()?;
        Ok(envelope)
    }

    fn check_snapshot(&self) -> Result<(), PersistenceError> {
        let snapshot = &self.snapshot;
        if !snapshot.pos.is_finite() || !snapshot.vel.is_finite() {
            return Err(PersistenceError::Inconsistent("non-finite position or velocity"));
        }
        if !(snapshot.fuel >= 0.0) {
            return Err(PersistenceError::Inconsistent("negative fuel"));
        }
        if snapshot.lander_width as f32 > self.terrain.pad().width() {
            return Err(PersistenceError::Inconsistent("lander wider than the pad"));
        }
        if snapshot.phase.requires_outcome() && snapshot.end_state.is_none() {
            return Err(PersistenceError::Inconsistent("crashed or finished game without an outcome"));
        }
        Ok(())
    }

    /// Rebuild the session this envelope was captured from
    pub fn into_session(self, settings: Settings) -> Result<Session, PersistenceError> {
        Ok(Session::restore(settings, self.terrain, &self.snapshot)?)
    }
}
