//! Landing outcome classification

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// How a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndOutcome {
    /// Landed on the pad within all limits
    Safe,
    /// Vertical speed over the limit
    CrashVertical,
    /// Horizontal speed over the limit
    CrashHorizontal,
    /// Tilted too far (rotation mode)
    CrashAngle,
    /// Touched down off the pad or on uneven ground
    CrashOffPad,
    /// Left the playable volume before touching down
    OutOfRange,
}

impl EndOutcome {
    pub fn is_safe(&self) -> bool {
        matches!(self, EndOutcome::Safe)
    }

    /// Crashes play the crash and explosion sequence before ending
    pub fn is_crash(&self) -> bool {
        matches!(
            self,
            EndOutcome::CrashVertical
                | EndOutcome::CrashHorizontal
                | EndOutcome::CrashAngle
                | EndOutcome::CrashOffPad
        )
    }
}

/// Touchdown limits, from settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingLimits {
    pub max_vx: f32,
    pub max_vy: f32,
    /// Only checked when the lander can rotate
    pub max_angle: Option<f32>,
}

impl From<&Settings> for LandingLimits {
    fn from(settings: &Settings) -> Self {
        Self {
            max_vx: settings.max_landing_vx,
            max_vy: settings.max_landing_vy,
            max_angle: settings.rotation.then_some(settings.max_landing_angle),
        }
    }
}

/// Everything the classifier looks at for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingSample {
    pub touched: bool,
    pub out_of_range: bool,
    /// Footprint lies fully within the pad
    pub on_pad: bool,
    /// All ground under the footprint is level
    pub landed_flat: bool,
    pub velocity: Vec2,
    /// Degrees from upright
    pub angle: f32,
}

/// Decide how the game ends, or `None` while the lander is still flying
///
/// First match wins: out of range, off the pad, uneven ground, vertical
/// speed, horizontal speed, tilt.
pub fn classify(sample: &LandingSample, limits: &LandingLimits) -> Option<EndOutcome> {
    if sample.out_of_range {
        return Some(EndOutcome::OutOfRange);
    }
    if !sample.touched {
        return None;
    }

    let outcome = if !sample.on_pad || !sample.landed_flat {
        EndOutcome::CrashOffPad
    } else if sample.velocity.y.abs() > limits.max_vy {
        EndOutcome::CrashVertical
    } else if sample.velocity.x.abs() > limits.max_vx {
        EndOutcome::CrashHorizontal
    } else if limits.max_angle.is_some_and(|max| sample.angle.abs() > max) {
        EndOutcome::CrashAngle
    } else {
        EndOutcome::Safe
    };
    Some(outcome)
}
