//! Game settings
//!
//! Supplied once at session start; a running session never re-reads them.
//! Persisted as JSON, separately from session saves.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::GamePhase;

/// Rejected configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("terrain needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("pad size {pad_size} must be at least 1 and below the {points} terrain points")]
    PadSize { pad_size: usize, points: usize },
    #[error("landing pad is {pad_width} units wide, lander needs {lander_width}")]
    PadNarrowerThanLander { pad_width: u32, lander_width: u32 },
    #[error("field {width}x{height} is too small for a {lander_height} unit tall lander")]
    FieldTooSmall {
        width: u32,
        height: u32,
        lander_height: u32,
    },
    #[error("terrain was built for a {terrain_width}x{terrain_height} field, settings use {width}x{height}")]
    TerrainFieldMismatch {
        terrain_width: f32,
        terrain_height: f32,
        width: u32,
        height: u32,
    },
    #[error("snapshot in {0:?} has no outcome")]
    MissingOutcome(GamePhase),
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Physics ===
    /// Gravity acceleration (m/s²)
    pub gravity: f32,
    /// Fuel at start (kg)
    pub initial_fuel: f32,
    /// Lander mass without fuel (kg)
    pub lander_mass: f32,
    /// Main engine thrust (N)
    pub main_force: f32,
    /// Attitude thruster force (N)
    pub attitude_force: f32,
    /// Main engine burn rate (kg/s)
    pub main_burn: f32,
    /// Attitude thruster burn rate (kg/s)
    pub attitude_burn: f32,

    // === Landing limits ===
    /// Max horizontal speed on touchdown (m/s)
    pub max_landing_vx: f32,
    /// Max vertical speed on touchdown (m/s)
    pub max_landing_vy: f32,
    /// Max tilt on touchdown (degrees, rotation mode only)
    pub max_landing_angle: f32,

    // === Options ===
    /// Swap the left and right thrusters
    pub reverse_side_thrust: bool,
    /// Report firing thrusters to the renderer
    pub draw_flame: bool,
    /// Side thrusters rotate the lander instead of pushing it
    pub rotation: bool,

    // === Field ===
    pub field_width: u32,
    pub field_height: u32,
    /// Lander sprite size; the width is the collision footprint
    pub lander_width: u32,
    pub lander_height: u32,

    // === Terrain ===
    pub terrain_points: usize,
    /// Landing pad length in terrain intervals
    pub pad_size: usize,
    /// Max height change between neighbouring terrain points
    pub steepness: i32,

    // === Timing ===
    /// Simulated seconds per tick
    pub dt: f32,
    /// Wall-clock milliseconds between ticks
    pub tick_interval_ms: u64,
    /// Measure the first ticks of a session and derive `dt` from them
    pub calibrate_timing: bool,
    /// Fixed seed for terrain generation (random when absent)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            initial_fuel: INITIAL_FUEL,
            lander_mass: LANDER_DRY_MASS,
            main_force: MAIN_FORCE,
            attitude_force: ATTITUDE_FORCE,
            main_burn: MAIN_BURN,
            attitude_burn: ATTITUDE_BURN,

            max_landing_vx: MAX_LANDING_VX,
            max_landing_vy: MAX_LANDING_VY,
            max_landing_angle: MAX_LANDING_ANGLE,

            reverse_side_thrust: false,
            draw_flame: true,
            rotation: false,

            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            lander_width: LANDER_WIDTH,
            lander_height: LANDER_HEIGHT,

            terrain_points: TERRAIN_POINTS,
            pad_size: PAD_SIZE,
            steepness: TERRAIN_STEEPNESS,

            dt: DEFAULT_DT,
            tick_interval_ms: TICK_INTERVAL_MS,
            calibrate_timing: true,
            seed: None,
        }
    }
}

impl Settings {
    /// Highest terrain point the generator may produce
    pub fn max_terrain_height(&self) -> i32 {
        (self.field_height / 6) as i32
    }

    /// Horizontal spacing between generated terrain points (before the remainder)
    pub fn terrain_increment(&self) -> u32 {
        self.field_width / (self.terrain_points.max(2) as u32 - 1)
    }

    /// Half the lander footprint
    pub fn footprint_half_width(&self) -> f32 {
        (self.lander_width / 2) as f32
    }

    /// Reject settings a session cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("gravity", self.gravity),
            ("lander_mass", self.lander_mass),
            ("dt", self.dt),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }

        let non_negative = [
            ("initial_fuel", self.initial_fuel),
            ("main_force", self.main_force),
            ("attitude_force", self.attitude_force),
            ("main_burn", self.main_burn),
            ("attitude_burn", self.attitude_burn),
            ("max_landing_vx", self.max_landing_vx),
            ("max_landing_vy", self.max_landing_vy),
            ("max_landing_angle", self.max_landing_angle),
            ("steepness", self.steepness as f32),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }

        if self.terrain_points < 2 {
            return Err(ConfigError::TooFewPoints(self.terrain_points));
        }
        if self.pad_size == 0 || self.pad_size >= self.terrain_points {
            return Err(ConfigError::PadSize {
                pad_size: self.pad_size,
                points: self.terrain_points,
            });
        }

        // Ground zero never exceeds the max terrain height, so this keeps the
        // altitude scale finite and positive.
        if self.lander_width == 0
            || self.field_width == 0
            || self.max_terrain_height() <= TERRAIN_FLOOR
            || self.field_height as i32 - self.max_terrain_height() - self.lander_height as i32 <= 0
        {
            return Err(ConfigError::FieldTooSmall {
                width: self.field_width,
                height: self.field_height,
                lander_height: self.lander_height,
            });
        }

        let pad_width = self.terrain_increment() * self.pad_size as u32;
        if pad_width < self.lander_width {
            return Err(ConfigError::PadNarrowerThanLander {
                pad_width,
                lander_width: self.lander_width,
            });
        }

        Ok(())
    }

    /// Read settings from a JSON file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Read settings, falling back to defaults when the file is missing or invalid
    pub fn load(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
