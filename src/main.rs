//! Lunar Lander headless entry point
//!
//! Runs one game on the tick thread with a simple autopilot and logs the
//! result. Usage: `lunar-lander [settings.json] ["height plot"]`

use std::path::Path;
use std::time::Duration;

use lunar_lander::messages::end_message;
use lunar_lander::sim::{GamePhase, TerrainProfile, parse_plot};
use lunar_lander::{ConfigError, Session, SessionDriver, SessionHandle, Settings, Telemetry, Thruster};

/// Fastest descent the autopilot aims for (m/s)
const DESCENT_RATE: f32 = 8.0;
/// Horizontal speed the autopilot allows while crossing to the pad (m/s)
const CROSSING_SPEED: f32 = 0.8;

fn main() {
    env_logger::init();
    log::info!("Lunar Lander (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match load_settings(args.next().as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let session = match build_session(settings, args.next()) {
        Ok(session) => session,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    let interval = Duration::from_millis(session.settings().tick_interval_ms);
    let reverse = session.settings().reverse_side_thrust;

    let mut driver = match SessionDriver::spawn(session, interval) {
        Ok(driver) => driver,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    let handle = driver.handle();

    let mut polls = 0u32;
    let outcome = loop {
        if let Ok(outcome) = driver.outcomes().recv_timeout(interval) {
            break outcome;
        }
        let telemetry = handle.telemetry();
        fly(&handle, &telemetry, reverse);

        polls += 1;
        if polls % 20 == 0 && telemetry.phase == GamePhase::Active {
            log::info!("{}", telemetry);
        }
    };

    let final_state = handle.telemetry();
    if let Err(e) = driver.stop() {
        log::error!("{}", e);
    }

    if outcome.is_safe() {
        log::info!("{}", final_state);
    } else {
        log::warn!("{}", final_state);
    }
    let message = end_message(outcome, &mut rand::rng());
    println!("{}", message);
    println!("Flight time: {:.1}s", final_state.flight_time);
}

/// Settings from the named file, or defaults when none is given
fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    match path {
        Some(path) => Settings::load_from(Path::new(path)),
        None => Ok(Settings::default()),
    }
}

fn build_session(settings: Settings, plot: Option<String>) -> Result<Session, Box<dyn std::error::Error>> {
    match plot {
        Some(plot) => {
            let plot = parse_plot(&plot)?;
            let terrain = TerrainProfile::from_plot(&plot, &settings)?;
            Ok(Session::with_terrain(settings, terrain)?)
        }
        None => Ok(Session::new(settings)?),
    }
}

/// One autopilot decision: drift over the pad, then descend under the vertical limit
fn fly(handle: &SessionHandle, telemetry: &Telemetry, reverse: bool) {
    if !matches!(telemetry.phase, GamePhase::Hold | GamePhase::Active) {
        return;
    }

    let pad = handle.with_session(|s| *s.terrain().pad());
    let target_x = (pad.x_start + pad.x_end) / 2.0;
    let dx = target_x - telemetry.position.x;
    let over_pad = dx.abs() < pad.width() / 4.0;

    let wanted_vx = if over_pad {
        0.0
    } else {
        CROSSING_SPEED.copysign(dx)
    };
    // Left pushes towards +x unless the thrusters are swapped
    let (plus_x, minus_x) = if reverse {
        (Thruster::Right, Thruster::Left)
    } else {
        (Thruster::Left, Thruster::Right)
    };
    handle.set_control(plus_x, telemetry.vx < wanted_vx - 0.2);
    handle.set_control(minus_x, telemetry.vx > wanted_vx + 0.2);

    let wanted_vy = if over_pad {
        -(telemetry.altitude / 20.0).clamp(2.0, DESCENT_RATE)
    } else {
        0.0
    };
    handle.set_control(Thruster::Main, telemetry.vy < wanted_vy);
}
