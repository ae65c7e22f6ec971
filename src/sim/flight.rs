//! Lander flight state and the per-tick integrator
//!
//! Semi-implicit Euler: velocity first, then position from the new velocity.
//! Vertical motion is in meters scaled by the terrain's altitude scale,
//! horizontal motion uses half that scale.
//!
//! When fuel runs out during a tick the thrusters still deliver their full
//! acceleration for that tick and the burn is clamped to what was left.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::normalize_degrees;
use crate::settings::Settings;

/// One of the lander's three thrusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Thruster {
    Main,
    Left,
    Right,
}

/// Which thrusters the pilot is holding
///
/// Left and right may both be held; in translation mode they cancel out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrusterFlags {
    pub main: bool,
    pub left: bool,
    pub right: bool,
}

impl ThrusterFlags {
    pub fn set(&mut self, thruster: Thruster, firing: bool) {
        match thruster {
            Thruster::Main => self.main = firing,
            Thruster::Left => self.left = firing,
            Thruster::Right => self.right = firing,
        }
    }

    pub fn any(&self) -> bool {
        self.main || self.left || self.right
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Left and right swapped
    pub fn mirrored(self) -> Self {
        Self {
            main: self.main,
            left: self.right,
            right: self.left,
        }
    }
}

/// Physical constants for the integrator, taken from settings at session start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightParams {
    pub gravity: f32,
    pub dry_mass: f32,
    pub main_force: f32,
    pub attitude_force: f32,
    pub main_burn: f32,
    pub attitude_burn: f32,
    pub reverse_side_thrust: bool,
    pub rotation: bool,
}

impl From<&Settings> for FlightParams {
    fn from(settings: &Settings) -> Self {
        Self {
            gravity: settings.gravity,
            dry_mass: settings.lander_mass,
            main_force: settings.main_force,
            attitude_force: settings.attitude_force,
            main_burn: settings.main_burn,
            attitude_burn: settings.attitude_burn,
            reverse_side_thrust: settings.reverse_side_thrust,
            rotation: settings.rotation,
        }
    }
}

/// Kinematic and fuel state of the lander
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    /// World position of the lander's bottom center
    pub pos: Vec2,
    /// Velocity in m/s
    pub vel: Vec2,
    /// Fuel remaining in kg, never negative
    pub fuel: f32,
    /// Tilt in degrees, 0 = upright (rotation mode only)
    pub angle: f32,
    pub thrusters: ThrusterFlags,
}

impl FlightState {
    pub fn new(pos: Vec2, fuel: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            fuel: fuel.max(0.0),
            angle: 0.0,
            thrusters: ThrusterFlags::default(),
        }
    }

    /// Current mass including fuel
    pub fn mass(&self, params: &FlightParams) -> f32 {
        params.dry_mass + self.fuel
    }

    /// Thrusters that actually produce thrust this tick
    pub fn effective_thrusters(&self, params: &FlightParams) -> ThrusterFlags {
        if self.fuel <= 0.0 {
            return ThrusterFlags::default();
        }
        if params.reverse_side_thrust {
            self.thrusters.mirrored()
        } else {
            self.thrusters
        }
    }
}

/// What a single integration step did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Acceleration applied this tick (m/s²)
    pub accel: Vec2,
    /// Fuel consumed this tick (kg)
    pub burned: f32,
}

/// Advance the lander by one tick of `dt` simulated seconds
///
/// `altitude_scale` is meters per world unit (see `TerrainProfile::altitude_scale`).
pub fn step(state: &mut FlightState, params: &FlightParams, dt: f32, altitude_scale: f32) -> StepReport {
    let mass = state.mass(params);
    let firing = state.effective_thrusters(params);

    let mut accel = Vec2::new(0.0, -params.gravity);
    let mut burn_rate = 0.0;
    let mut main_accel = 0.0;

    if firing.main {
        burn_rate += params.main_burn;
        if params.rotation {
            main_accel = params.main_force / mass;
        } else {
            accel.y += params.main_force / mass;
        }
    }
    if firing.left {
        burn_rate += params.attitude_burn;
        if params.rotation {
            state.angle += 1.0;
        } else {
            accel.x += params.attitude_force / mass;
        }
    }
    if firing.right {
        burn_rate += params.attitude_burn;
        if params.rotation {
            state.angle -= 1.0;
        } else {
            accel.x -= params.attitude_force / mass;
        }
    }

    if params.rotation {
        state.angle = normalize_degrees(state.angle);
        let radians = state.angle.to_radians();
        accel.x = radians.sin() * main_accel;
        accel.y += radians.cos() * main_accel;
    }

    let burned = (burn_rate * dt).min(state.fuel);
    state.fuel = (state.fuel - burned).max(0.0);

    state.vel += accel * dt;
    state.pos.y += state.vel.y * dt / altitude_scale;
    state.pos.x += state.vel.x * dt / (altitude_scale / 2.0);

    StepReport { accel, burned }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SCALE: f32 = 3.0;

    fn params() -> FlightParams {
        FlightParams::from(&Settings::default())
    }

    fn lander(fuel: f32) -> FlightState {
        FlightState::new(Vec2::new(400.0, 300.0), fuel)
    }

    #[test]
    fn test_free_fall() {
        let mut state = lander(1000.0);
        let report = step(&mut state, &params(), 0.5, SCALE);

        assert_eq!(report.accel, Vec2::new(0.0, -3.0));
        assert_eq!(report.burned, 0.0);
        assert_eq!(state.vel, Vec2::new(0.0, -1.5));
        // Position uses the updated velocity
        assert!((state.pos.y - (300.0 - 1.5 * 0.5 / SCALE)).abs() < 1e-4);
        assert_eq!(state.fuel, 1000.0);
    }

    #[test]
    fn test_main_thrust_counters_gravity() {
        let mut state = lander(1000.0);
        state.thrusters.main = true;
        let report = step(&mut state, &params(), 0.5, SCALE);

        // 10000 N / 2000 kg = 5 m/s² up, minus gravity
        assert!((report.accel.y - 2.0).abs() < 1e-5);
        assert_eq!(report.burned, 5.0);
        assert_eq!(state.fuel, 995.0);
        assert!(state.vel.y > 0.0);
    }

    #[test]
    fn test_side_thrusters() {
        let mut state = lander(1000.0);
        state.thrusters.left = true;
        let report = step(&mut state, &params(), 1.0, SCALE);
        assert!((report.accel.x - 1.0).abs() < 1e-5);
        assert!(state.pos.x > 400.0);
        // Horizontal motion uses half the vertical scale
        assert!((state.pos.x - (400.0 + 1.0 / (SCALE / 2.0))).abs() < 1e-4);

        let mut state = lander(1000.0);
        state.thrusters.right = true;
        let report = step(&mut state, &params(), 1.0, SCALE);
        assert!((report.accel.x + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_both_side_thrusters_cancel_but_burn() {
        let mut state = lander(1000.0);
        state.thrusters.left = true;
        state.thrusters.right = true;
        let report = step(&mut state, &params(), 1.0, SCALE);
        assert_eq!(report.accel.x, 0.0);
        assert_eq!(report.burned, 4.0);
    }

    #[test]
    fn test_reverse_side_thrust_swaps_direction() {
        let params = FlightParams {
            reverse_side_thrust: true,
            ..params()
        };
        let mut state = lander(1000.0);
        state.thrusters.left = true;
        let report = step(&mut state, &params, 1.0, SCALE);
        assert!(report.accel.x < 0.0);
    }

    #[test]
    fn test_no_thrust_without_fuel() {
        let mut state = lander(0.0);
        state.thrusters = ThrusterFlags {
            main: true,
            left: true,
            right: false,
        };
        let report = step(&mut state, &params(), 0.5, SCALE);
        assert_eq!(report.accel, Vec2::new(0.0, -3.0));
        assert_eq!(report.burned, 0.0);
        assert_eq!(state.fuel, 0.0);
    }

    #[test]
    fn test_last_fuel_gives_full_tick_of_thrust() {
        let mut state = lander(1.0);
        state.thrusters.main = true;
        let report = step(&mut state, &params(), 0.5, SCALE);
        // 10000 N / 1001 kg for the whole tick, even though only 1 kg was left
        assert!((report.accel.y - (10000.0 / 1001.0 - 3.0)).abs() < 1e-4);
        assert_eq!(report.burned, 1.0);
        assert_eq!(state.fuel, 0.0);
    }

    #[test]
    fn test_rotation_mode_tilts_and_thrusts_along_angle() {
        let params = FlightParams {
            rotation: true,
            ..params()
        };
        let mut state = lander(1000.0);
        state.thrusters.left = true;
        for _ in 0..90 {
            step(&mut state, &params, 0.1, SCALE);
        }
        assert!((state.angle - 90.0).abs() < 1e-3);

        state.thrusters = ThrusterFlags {
            main: true,
            ..ThrusterFlags::default()
        };
        let report = step(&mut state, &params, 0.1, SCALE);
        // Lying on its side: main thrust pushes sideways only
        assert!(report.accel.x > 0.0);
        assert!((report.accel.y + 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotation_angle_wraps() {
        let params = FlightParams {
            rotation: true,
            ..params()
        };
        let mut state = lander(1000.0);
        state.angle = -180.0 + 0.5;
        state.thrusters.right = true;
        step(&mut state, &params, 0.1, SCALE);
        assert!((state.angle - 179.5).abs() < 1e-3);
    }

    #[test]
    fn test_same_inputs_same_trajectory() {
        let controls = [true, true, false, true, false, false, true];
        let run = || {
            let mut state = lander(50.0);
            let mut trajectory = Vec::new();
            for &main in &controls {
                state.thrusters.main = main;
                state.thrusters.left = !main;
                step(&mut state, &params(), 0.375, SCALE);
                trajectory.push((state.pos, state.vel, state.fuel));
            }
            trajectory
        };
        assert_eq!(run(), run());
    }

    proptest! {
        #[test]
        fn prop_fuel_never_increases_or_goes_negative(
            fuel in 0.0f32..100.0,
            controls in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 1..200),
        ) {
            let mut state = lander(fuel);
            let params = params();
            for (main, left, right) in controls {
                state.thrusters = ThrusterFlags { main, left, right };
                let before = state.fuel;
                let report = step(&mut state, &params, 0.5, SCALE);
                prop_assert!(state.fuel <= before);
                prop_assert!(state.fuel >= 0.0);
                if before <= 0.0 {
                    prop_assert_eq!(report.accel, Vec2::new(0.0, -params.gravity));
                }
            }
        }
    }
}
