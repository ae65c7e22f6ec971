//! Session-level state types
//!
//! The phase machine values, what the renderer polls each frame, and the flat
//! snapshot written on suspend.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::flight::ThrusterFlags;
use super::outcome::EndOutcome;

/// Current phase of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Fresh terrain and lander, routed on the next tick
    New,
    /// Measuring real tick time to derive the simulation step
    TimingCalibration,
    /// Waiting for the first control input
    Hold,
    /// Lander in flight
    Active,
    /// Touched down, outcome decided on the next tick
    EndGame,
    /// Left the playable volume
    OutOfRange,
    /// Landed safely, notification pending
    Safe,
    /// Crash frames, one per tick
    Crash1,
    Crash2,
    Crash3,
    /// Explosion animation
    Exploding,
    /// Game over; waits for new game or restart
    Inactive,
}

impl GamePhase {
    /// Whether thruster flags may change in this phase
    pub fn accepts_controls(&self) -> bool {
        matches!(self, GamePhase::Hold | GamePhase::Active)
    }

    /// Phases that only exist once the outcome has been decided
    pub fn requires_outcome(&self) -> bool {
        matches!(
            self,
            GamePhase::Crash1
                | GamePhase::Crash2
                | GamePhase::Crash3
                | GamePhase::Exploding
                | GamePhase::Inactive
        )
    }

    pub fn can_restart(&self) -> bool {
        matches!(self, GamePhase::Inactive | GamePhase::Hold)
    }
}

/// Which image the renderer should draw for the lander
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LanderSprite {
    #[default]
    Lander,
    Crash1,
    Crash2,
    Crash3,
    /// Explosion image index, 0-based
    Explosion(u8),
}

/// Read-only view for the presentation layer, polled once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub phase: GamePhase,
    /// Meters above ground zero
    pub altitude: f32,
    pub vx: f32,
    pub vy: f32,
    pub fuel: f32,
    /// World position of the lander's bottom center
    pub position: Vec2,
    /// Degrees from upright
    pub angle: f32,
    /// Flames to draw (empty unless flames are enabled and thrust is being produced)
    pub flames: ThrusterFlags,
    pub sprite: LanderSprite,
    /// Simulated seconds since the first control input
    pub flight_time: f32,
    pub end_state: Option<EndOutcome>,
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ALT {:.2}  VX {:.2}  VY {:.2}  FUEL {:.2}",
            self.altitude, self.vx, self.vy, self.fuel
        )
    }
}

/// Flat session record for suspend/resume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: GamePhase,
    pub end_state: Option<EndOutcome>,
    pub pos: Vec2,
    pub vel: Vec2,
    pub lander_width: u32,
    pub lander_height: u32,
    pub fuel: f32,
    #[serde(default)]
    pub angle: f32,
    /// Simulation step in use (calibrated or nominal)
    pub dt: f32,
}
