//! Deterministic simulation module
//!
//! All flight and landing logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (the step is measured once, then fixed)
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod collision;
pub mod flight;
pub mod outcome;
pub mod state;
pub mod terrain;
pub mod tick;

pub use collision::{ContactResult, resolve_contact};
pub use flight::{FlightParams, FlightState, StepReport, Thruster, ThrusterFlags, step};
pub use outcome::{EndOutcome, LandingLimits, LandingSample, classify};
pub use state::{GamePhase, LanderSprite, SessionSnapshot, Telemetry};
pub use terrain::{LandingPad, TerrainError, TerrainProfile, format_plot, parse_plot};
pub use tick::Session;
