//! Lunar Lander - flight physics and landing evaluation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, flight physics, contact, outcome, game loop)
//! - `settings`: Validated game configuration
//! - `persistence`: Suspend/resume save envelope
//! - `messages`: End-of-game text for the presentation layer
//! - `driver`: Fixed-cadence tick thread for a single session

pub mod driver;
pub mod messages;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use driver::{SessionDriver, SessionHandle};
pub use settings::{ConfigError, Settings};
pub use sim::{EndOutcome, GamePhase, Session, Telemetry, Thruster};

/// Game configuration constants
pub mod consts {
    /// Nominal simulated seconds per tick (before calibration)
    pub const DEFAULT_DT: f32 = 0.5;
    /// Wall-clock interval between ticks in milliseconds
    pub const TICK_INTERVAL_MS: u64 = 50;

    /// Number of ticks measured while calibrating `dt`
    pub const CALIBRATION_TICKS: u32 = 10;
    /// Simulated seconds per wall-clock second of tick time
    pub const CALIBRATION_FACTOR: f32 = 7.5;

    /// Field defaults (world units)
    pub const FIELD_WIDTH: u32 = 800;
    pub const FIELD_HEIGHT: u32 = 500;

    /// Lander sprite defaults (world units)
    pub const LANDER_WIDTH: u32 = 32;
    pub const LANDER_HEIGHT: u32 = 32;

    /// Terrain defaults
    pub const TERRAIN_POINTS: usize = 31;
    pub const PAD_SIZE: usize = 4;
    pub const TERRAIN_STEEPNESS: i32 = 25;
    /// Lowest terrain height (world units above the field bottom)
    pub const TERRAIN_FLOOR: i32 = 5;

    /// Altitude span (meters) mapped onto the field above ground zero
    pub const ALTITUDE_SPAN_M: f32 = 1200.0;
    /// Spawn altitude above ground zero (meters)
    pub const SPAWN_ALTITUDE_M: f32 = 1000.0;

    /// Out-of-range bounds (meters)
    pub const MAX_ALTITUDE_M: f32 = 5000.0;
    pub const MIN_ALTITUDE_M: f32 = -500.0;
    pub const MAX_HORIZONTAL_OFFSET_M: f32 = 1000.0;

    /// Physics defaults
    pub const GRAVITY: f32 = 3.0;
    pub const INITIAL_FUEL: f32 = 1000.0;
    pub const LANDER_DRY_MASS: f32 = 1000.0;
    pub const MAIN_FORCE: f32 = 10000.0;
    pub const ATTITUDE_FORCE: f32 = 2000.0;
    pub const MAIN_BURN: f32 = 10.0;
    pub const ATTITUDE_BURN: f32 = 2.0;

    /// Landing limits
    pub const MAX_LANDING_VX: f32 = 1.0;
    pub const MAX_LANDING_VY: f32 = 10.0;
    /// Degrees, rotation mode only
    pub const MAX_LANDING_ANGLE: f32 = 5.0;

    /// Explosion images in the crash sequence
    pub const EXPLOSION_FRAMES: u8 = 10;
    /// Flicker frames shown after the explosion plays out
    pub const EXPLOSION_FLICKER_TICKS: u8 = 12;
}

/// Linear interpolation of the height at `x` on the segment `a`-`b`
#[inline]
pub fn interpolate_height(a: glam::Vec2, b: glam::Vec2, x: f32) -> f32 {
    if (b.x - a.x).abs() < f32::EPSILON {
        return a.y;
    }
    a.y + (b.y - a.y) * (x - a.x) / (b.x - a.x)
}

/// Wrap an angle in degrees to (-180, 180]
#[inline]
pub fn normalize_degrees(mut angle: f32) -> f32 {
    while angle <= -180.0 {
        angle += 360.0;
    }
    while angle > 180.0 {
        angle -= 360.0;
    }
    angle
}
