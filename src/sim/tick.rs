//! Game session and its fixed-cadence tick
//!
//! `Session` owns the terrain, the lander and the phase machine. Callers drive
//! it with `tick(now)` at a fixed interval and poke it with commands between
//! ticks; the caller is responsible for making the two mutually exclusive
//! (see `driver`).

use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::{ContactResult, resolve_contact};
use super::flight::{FlightParams, FlightState, Thruster, step};
use super::outcome::{EndOutcome, LandingLimits, LandingSample, classify};
use super::state::{GamePhase, LanderSprite, SessionSnapshot, Telemetry};
use super::terrain::TerrainProfile;
use crate::consts::{CALIBRATION_FACTOR, CALIBRATION_TICKS, EXPLOSION_FLICKER_TICKS, EXPLOSION_FRAMES};
use crate::settings::{ConfigError, Settings};

/// Wall-clock measurement in progress
#[derive(Debug, Clone, Copy)]
struct Calibration {
    started: Instant,
    ticks: u32,
}

/// One game session: terrain, lander and phase
#[derive(Debug, Clone)]
pub struct Session {
    settings: Settings,
    params: FlightParams,
    limits: LandingLimits,
    /// Seed the session RNG was created from
    seed: u64,
    rng: Pcg32,
    terrain: TerrainProfile,
    flight: FlightState,
    phase: GamePhase,
    /// Outcome of the current game once decided
    end_state: Option<EndOutcome>,
    /// Outcome waiting to be picked up by the presentation layer
    unreported: Option<EndOutcome>,
    contact: ContactResult,
    sprite: LanderSprite,
    explosion_tick: u8,
    /// Simulated seconds per tick
    dt: f32,
    calibration: Option<Calibration>,
    calibrated: bool,
    flight_ticks: u64,
}

impl Session {
    /// Create a session with freshly generated terrain
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let seed = settings.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = Pcg32::seed_from_u64(seed);
        let terrain = TerrainProfile::generate(&settings, &mut rng)?;
        Ok(Self::assemble(settings, seed, rng, terrain))
    }

    /// Create a session on a given terrain (e.g. one built from a plot)
    pub fn with_terrain(settings: Settings, terrain: TerrainProfile) -> Result<Self, ConfigError> {
        settings.validate()?;
        check_terrain(&settings, &terrain)?;
        let seed = settings.seed.unwrap_or_else(|| rand::rng().random());
        let rng = Pcg32::seed_from_u64(seed);
        Ok(Self::assemble(settings, seed, rng, terrain))
    }

    /// Rebuild a suspended session
    pub fn restore(
        settings: Settings,
        terrain: TerrainProfile,
        snapshot: &SessionSnapshot,
    ) -> Result<Self, ConfigError> {
        if !(snapshot.dt > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "dt",
                value: snapshot.dt,
            });
        }
        if snapshot.phase.requires_outcome() && snapshot.end_state.is_none() {
            return Err(ConfigError::MissingOutcome(snapshot.phase));
        }
        let settings = Settings {
            lander_width: snapshot.lander_width,
            lander_height: snapshot.lander_height,
            ..settings
        };
        let mut session = Self::with_terrain(settings, terrain)?;

        session.flight.pos = snapshot.pos;
        session.flight.vel = snapshot.vel;
        session.flight.fuel = snapshot.fuel.max(0.0);
        session.flight.angle = snapshot.angle;
        session.phase = snapshot.phase;
        session.end_state = snapshot.end_state;
        session.dt = snapshot.dt;
        session.calibrated = true;
        session.contact = resolve_contact(
            session.flight.pos,
            session.settings.footprint_half_width(),
            &session.terrain,
        );
        session.sprite = match snapshot.phase {
            GamePhase::Crash1 => LanderSprite::Crash1,
            GamePhase::Crash2 => LanderSprite::Crash2,
            GamePhase::Crash3 | GamePhase::Exploding => LanderSprite::Crash3,
            GamePhase::Inactive if snapshot.end_state.is_some_and(|o| o.is_crash()) => {
                LanderSprite::Crash3
            }
            _ => LanderSprite::Lander,
        };

        log::info!("Restored session in {:?}", session.phase);
        Ok(session)
    }

    fn assemble(settings: Settings, seed: u64, rng: Pcg32, terrain: TerrainProfile) -> Self {
        let flight = FlightState::new(terrain.spawn_position(), settings.initial_fuel);
        log::info!(
            "New session (seed {}), pad at x {}..{}",
            seed,
            terrain.pad().x_start,
            terrain.pad().x_end
        );
        Self {
            params: FlightParams::from(&settings),
            limits: LandingLimits::from(&settings),
            dt: settings.dt,
            settings,
            seed,
            rng,
            terrain,
            flight,
            phase: GamePhase::New,
            end_state: None,
            unreported: None,
            contact: ContactResult::miss(),
            sprite: LanderSprite::Lander,
            explosion_tick: 0,
            calibration: None,
            calibrated: false,
            flight_ticks: 0,
        }
    }

    // === Commands ===

    /// Throw away the current game and start over on new terrain (valid any time)
    pub fn start_new_game(&mut self) {
        match TerrainProfile::generate(&self.settings, &mut self.rng) {
            Ok(terrain) => self.terrain = terrain,
            Err(e) => log::error!("Terrain generation failed, keeping current terrain: {}", e),
        }
        self.reset_flight();
        self.phase = GamePhase::New;
        log::info!("New game");
    }

    /// Start over on the given terrain (valid any time)
    ///
    /// Terrain built for a different field or lander is rejected and the
    /// current game carries on.
    pub fn start_custom_game(&mut self, terrain: TerrainProfile) -> Result<(), ConfigError> {
        check_terrain(&self.settings, &terrain)?;
        self.terrain = terrain;
        self.reset_flight();
        self.phase = GamePhase::New;
        log::info!("New game on custom terrain");
        Ok(())
    }

    /// Same terrain, fresh lander. Only from `Inactive` or `Hold`.
    pub fn restart(&mut self) -> bool {
        if !self.phase.can_restart() {
            log::debug!("Restart ignored in {:?}", self.phase);
            return false;
        }
        self.reset_flight();
        self.phase = GamePhase::Hold;
        log::info!("Restart");
        true
    }

    /// Press or release a thruster
    ///
    /// Any control event in `Hold` starts the flight. Returns whether the
    /// event was accepted.
    pub fn set_control(&mut self, thruster: Thruster, pressed: bool) -> bool {
        if !self.phase.accepts_controls() {
            log::debug!("{:?} control ignored in {:?}", thruster, self.phase);
            return false;
        }
        if self.phase == GamePhase::Hold {
            self.phase = GamePhase::Active;
            log::debug!("Flight started");
        }
        self.flight.thrusters.set(thruster, pressed);
        true
    }

    pub fn press(&mut self, thruster: Thruster) -> bool {
        self.set_control(thruster, true)
    }

    pub fn release(&mut self, thruster: Thruster) -> bool {
        self.set_control(thruster, false)
    }

    /// The end-of-game outcome, handed out exactly once per game
    pub fn take_outcome(&mut self) -> Option<EndOutcome> {
        self.unreported.take()
    }

    // === Tick ===

    /// Advance the session by one tick; `now` is only used for timing calibration
    pub fn tick(&mut self, now: Instant) {
        match self.phase {
            GamePhase::New => {
                if self.settings.calibrate_timing && !self.calibrated {
                    self.calibration = Some(Calibration {
                        started: now,
                        ticks: 0,
                    });
                    self.phase = GamePhase::TimingCalibration;
                } else {
                    self.phase = GamePhase::Hold;
                }
            }
            GamePhase::TimingCalibration => self.calibrate(now),
            GamePhase::Hold | GamePhase::Inactive => {}
            GamePhase::Active => self.fly(),
            GamePhase::EndGame => self.judge_landing(),
            GamePhase::OutOfRange => self.finish(EndOutcome::OutOfRange),
            GamePhase::Safe => self.finish(EndOutcome::Safe),
            GamePhase::Crash1 => {
                if let Some(ground) = self.contact.ground_at_center {
                    self.flight.pos.y = drop_to_ground(self.flight.pos.y, ground);
                }
                self.sprite = LanderSprite::Crash1;
                self.phase = GamePhase::Crash2;
            }
            GamePhase::Crash2 => {
                self.sprite = LanderSprite::Crash2;
                self.phase = GamePhase::Crash3;
            }
            GamePhase::Crash3 => {
                self.sprite = LanderSprite::Crash3;
                self.explosion_tick = 0;
                self.phase = GamePhase::Exploding;
            }
            GamePhase::Exploding => self.explode(),
        }
    }

    fn calibrate(&mut self, now: Instant) {
        let Some(calibration) = self.calibration.as_mut() else {
            self.phase = GamePhase::Hold;
            return;
        };

        calibration.ticks += 1;
        if calibration.ticks < CALIBRATION_TICKS {
            return;
        }

        let elapsed = now.saturating_duration_since(calibration.started).as_secs_f32();
        let dt = CALIBRATION_FACTOR * elapsed / calibration.ticks as f32;
        if dt > 0.0 {
            log::info!("Calibrated time step: {:.3}s (was {:.3}s)", dt, self.dt);
            self.dt = dt;
        } else {
            log::warn!("Calibration measured no elapsed time, keeping {:.3}s", self.dt);
        }
        self.calibration = None;
        self.calibrated = true;
        self.phase = GamePhase::Hold;
    }

    fn fly(&mut self) {
        step(
            &mut self.flight,
            &self.params,
            self.dt,
            self.terrain.altitude_scale(),
        );
        self.flight_ticks += 1;

        self.contact = resolve_contact(
            self.flight.pos,
            self.settings.footprint_half_width(),
            &self.terrain,
        );

        if self.contact.touched {
            log::debug!("Touchdown at {:?}, velocity {:?}", self.flight.pos, self.flight.vel);
            self.phase = GamePhase::EndGame;
        } else if self.terrain.is_out_of_range(self.flight.pos) {
            log::debug!("Out of range at {:?}", self.flight.pos);
            self.phase = GamePhase::OutOfRange;
        }
    }

    fn judge_landing(&mut self) {
        let half = self.settings.footprint_half_width();
        let sample = LandingSample {
            touched: true,
            out_of_range: self.terrain.is_out_of_range(self.flight.pos),
            on_pad: self
                .terrain
                .pad()
                .contains_span(self.flight.pos.x - half, self.flight.pos.x + half),
            landed_flat: self.contact.landed_flat(),
            velocity: self.flight.vel,
            angle: self.flight.angle,
        };
        let outcome = classify(&sample, &self.limits).unwrap_or(EndOutcome::CrashOffPad);
        self.end_state = Some(outcome);
        self.phase = match outcome {
            EndOutcome::Safe => GamePhase::Safe,
            EndOutcome::OutOfRange => GamePhase::OutOfRange,
            _ => GamePhase::Crash1,
        };
    }

    fn explode(&mut self) {
        let frames = 2 * EXPLOSION_FRAMES;
        let last = EXPLOSION_FRAMES - 1;
        if self.explosion_tick < frames {
            self.sprite = LanderSprite::Explosion(self.explosion_tick / 2);
        } else if self.explosion_tick < frames + EXPLOSION_FLICKER_TICKS {
            self.sprite = if self.explosion_tick % 2 == 0 {
                LanderSprite::Explosion(last)
            } else {
                LanderSprite::Explosion(last - 1)
            };
        } else {
            self.sprite = LanderSprite::Crash3;
            match self.end_state {
                Some(outcome) => self.finish(outcome),
                None => {
                    log::error!("Explosion finished without an outcome");
                    self.flight.thrusters.clear();
                    self.phase = GamePhase::Inactive;
                }
            }
            return;
        }
        self.explosion_tick += 1;
    }

    fn finish(&mut self, outcome: EndOutcome) {
        self.flight.thrusters.clear();
        self.end_state = Some(outcome);
        self.unreported = Some(outcome);
        self.phase = GamePhase::Inactive;
        log::info!(
            "Game over: {:?} (vx {:.2}, vy {:.2}, fuel {:.1})",
            outcome,
            self.flight.vel.x,
            self.flight.vel.y,
            self.flight.fuel
        );
    }

    fn reset_flight(&mut self) {
        self.flight = FlightState::new(self.terrain.spawn_position(), self.settings.initial_fuel);
        self.contact = ContactResult::miss();
        self.sprite = LanderSprite::Lander;
        self.explosion_tick = 0;
        self.end_state = None;
        self.unreported = None;
        self.flight_ticks = 0;
    }

    // === Queries ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn terrain(&self) -> &TerrainProfile {
        &self.terrain
    }

    pub fn flight(&self) -> &FlightState {
        &self.flight
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn end_state(&self) -> Option<EndOutcome> {
        self.end_state
    }

    /// Ground contact from the most recent flight tick
    pub fn contact(&self) -> &ContactResult {
        &self.contact
    }

    /// Per-frame view for the presentation layer
    pub fn telemetry(&self) -> Telemetry {
        let flames = if self.settings.draw_flame && self.phase == GamePhase::Active {
            self.flight.effective_thrusters(&self.params)
        } else {
            Default::default()
        };
        Telemetry {
            phase: self.phase,
            altitude: self.terrain.altitude_m(self.flight.pos.y),
            vx: self.flight.vel.x,
            vy: self.flight.vel.y,
            fuel: self.flight.fuel,
            position: self.flight.pos,
            angle: self.flight.angle,
            flames,
            sprite: self.sprite,
            flight_time: self.flight_ticks as f32 * self.dt,
            end_state: self.end_state,
        }
    }

    /// Flat record for suspend/resume
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            end_state: self.end_state,
            pos: self.flight.pos,
            vel: self.flight.vel,
            lander_width: self.settings.lander_width,
            lander_height: self.settings.lander_height,
            fuel: self.flight.fuel,
            angle: self.flight.angle,
            dt: self.dt,
        }
    }
}

/// Lower `y` whole units at a time until it is level with `ground` or reaches
/// the field bottom, keeping its fractional part
fn drop_to_ground(y: f32, ground: f32) -> f32 {
    if y <= 0.0 || y.trunc() <= ground {
        return y;
    }
    if ground < 0.0 {
        // The field bottom comes first
        return y - y.ceil();
    }
    ground + y.fract()
}

/// Reject terrain built for another field, or whose pad the lander cannot fit on
fn check_terrain(settings: &Settings, terrain: &TerrainProfile) -> Result<(), ConfigError> {
    if terrain.field_width() != settings.field_width as f32
        || terrain.field_height() != settings.field_height as f32
    {
        return Err(ConfigError::TerrainFieldMismatch {
            terrain_width: terrain.field_width(),
            terrain_height: terrain.field_height(),
            width: settings.field_width,
            height: settings.field_height,
        });
    }
    let pad_width = terrain.pad().width();
    if pad_width < settings.lander_width as f32 {
        return Err(ConfigError::PadNarrowerThanLander {
            pad_width: pad_width as u32,
            lander_width: settings.lander_width,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glam::Vec2;

    use super::*;

    /// 9 points, 100 units apart; pad is points 4..=7 (x 400..700) at height 30
    const PLOT: [i32; 9] = [60, 20, 20, 70, 30, 30, 30, 30, 90];

    fn settings() -> Settings {
        Settings {
            calibrate_timing: false,
            seed: Some(1234),
            ..Settings::default()
        }
    }

    fn custom_session() -> Session {
        let settings = settings();
        let terrain = TerrainProfile::from_plot(&PLOT, &settings).expect("plot has a pad");
        Session::with_terrain(settings, terrain).expect("valid settings")
    }

    /// Tick until the phase leaves `phase`, bounded
    fn tick_while(session: &mut Session, phase: GamePhase, now: Instant) -> u32 {
        let mut ticks = 0;
        while session.phase() == phase {
            session.tick(now);
            ticks += 1;
            assert!(ticks < 100_000, "stuck in {:?}", phase);
        }
        ticks
    }

    /// Put a held session's lander just above the ground at `x` with velocity `vel`
    fn place(session: &mut Session, x: f32, height_above: f32, vel: Vec2) {
        let ground = session.terrain().ground_zero();
        session.flight.pos = Vec2::new(x, ground + height_above);
        session.flight.vel = vel;
    }

    #[test]
    fn test_new_session_routes_to_hold() {
        let mut session = custom_session();
        assert_eq!(session.phase(), GamePhase::New);
        session.tick(Instant::now());
        assert_eq!(session.phase(), GamePhase::Hold);
        assert_eq!(session.flight().fuel, 1000.0);
        assert!((session.telemetry().altitude - 1000.0).abs() < 0.01);
    }

    #[test]
    fn test_hold_waits_for_input() {
        let mut session = custom_session();
        let now = Instant::now();
        session.tick(now);
        let start = session.flight().pos;
        for _ in 0..10 {
            session.tick(now);
        }
        assert_eq!(session.phase(), GamePhase::Hold);
        assert_eq!(session.flight().pos, start);

        assert!(session.press(Thruster::Main));
        assert_eq!(session.phase(), GamePhase::Active);
        assert!(session.flight().thrusters.main);
    }

    #[test]
    fn test_release_in_hold_also_starts_flight() {
        let mut session = custom_session();
        session.tick(Instant::now());
        assert!(session.release(Thruster::Left));
        assert_eq!(session.phase(), GamePhase::Active);
        assert!(!session.flight().thrusters.any());
    }

    #[test]
    fn test_controls_ignored_outside_hold_and_active() {
        let mut session = custom_session();
        assert!(!session.press(Thruster::Main), "New does not accept controls");
        session.tick(Instant::now());
        session.press(Thruster::Main);
        session.flight.pos.y = -10.0;
        session.tick(Instant::now());
        assert_eq!(session.phase(), GamePhase::EndGame);
        assert!(!session.press(Thruster::Left));
    }

    #[test]
    fn test_timing_calibration() {
        let mut session = Session::with_terrain(
            Settings {
                calibrate_timing: true,
                ..settings()
            },
            TerrainProfile::from_plot(&PLOT, &settings()).expect("plot has a pad"),
        )
        .expect("valid settings");

        let start = Instant::now();
        session.tick(start);
        assert_eq!(session.phase(), GamePhase::TimingCalibration);
        assert!(!session.press(Thruster::Main));

        for i in 1..=10 {
            session.tick(start + Duration::from_millis(50 * i));
        }
        assert_eq!(session.phase(), GamePhase::Hold);
        // 7.5 * 0.5s / 10 ticks
        assert!((session.dt() - 0.375).abs() < 1e-4);

        // Calibration runs once per session
        session.start_new_game();
        session.tick(start);
        assert_eq!(session.phase(), GamePhase::Hold);
    }

    #[test]
    fn test_calibration_without_elapsed_time_keeps_nominal_dt() {
        let mut session = Session::with_terrain(
            Settings {
                calibrate_timing: true,
                ..settings()
            },
            TerrainProfile::from_plot(&PLOT, &settings()).expect("plot has a pad"),
        )
        .expect("valid settings");
        let now = Instant::now();
        for _ in 0..11 {
            session.tick(now);
        }
        assert_eq!(session.phase(), GamePhase::Hold);
        assert_eq!(session.dt(), 0.5);
    }

    #[test]
    fn test_safe_landing_sequence() {
        let mut session = custom_session();
        let now = Instant::now();
        session.tick(now);
        session.release(Thruster::Main);
        place(&mut session, 550.0, 0.5, Vec2::new(0.5, -6.0));

        session.tick(now);
        assert_eq!(session.phase(), GamePhase::EndGame);
        session.tick(now);
        assert_eq!(session.phase(), GamePhase::Safe);
        assert_eq!(session.take_outcome(), None, "not reported until the Safe tick");
        session.tick(now);
        assert_eq!(session.phase(), GamePhase::Inactive);
        assert_eq!(session.take_outcome(), Some(EndOutcome::Safe));
        assert_eq!(session.take_outcome(), None);
        assert_eq!(session.telemetry().sprite, LanderSprite::Lander);
    }

    #[test]
    fn test_crash_sequence_shape() {
        let mut session = custom_session();
        let now = Instant::now();
        session.tick(now);
        session.release(Thruster::Main);
        place(&mut session, 550.0, 0.5, Vec2::new(0.0, -15.0));

        session.tick(now);
        assert_eq!(session.phase(), GamePhase::EndGame);
        session.tick(now);
        assert_eq!(session.phase(), GamePhase::Crash1);
        assert_eq!(session.end_state(), Some(EndOutcome::CrashVertical));

        session.tick(now);
        assert_eq!(session.phase(), GamePhase::Crash2);
        assert_eq!(session.telemetry().sprite, LanderSprite::Crash1);
        assert!(session.flight().pos.y <= 30.0 + 1.0, "dropped onto the ground");

        session.tick(now);
        assert_eq!(session.phase(), GamePhase::Crash3);
        session.tick(now);
        assert_eq!(session.phase(), GamePhase::Exploding);
        assert_eq!(session.telemetry().sprite, LanderSprite::Crash3);

        session.tick(now);
        assert_eq!(session.telemetry().sprite, LanderSprite::Explosion(0));

        let mut sprites = Vec::new();
        while session.phase() == GamePhase::Exploding {
            assert_eq!(session.take_outcome(), None);
            session.tick(now);
            sprites.push(session.telemetry().sprite);
        }
        // 20 explosion frames + 12 flicker frames + the final tick
        assert_eq!(sprites.len(), 32);
        assert_eq!(sprites[0], LanderSprite::Explosion(0));
        assert_eq!(sprites[18], LanderSprite::Explosion(9));
        assert_eq!(sprites[19], LanderSprite::Explosion(9));
        assert_eq!(sprites[20], LanderSprite::Explosion(8));
        assert_eq!(sprites[31], LanderSprite::Crash3);

        assert_eq!(session.phase(), GamePhase::Inactive);
        assert_eq!(session.take_outcome(), Some(EndOutcome::CrashVertical));
    }

    #[test]
    fn test_landing_straddling_pad_edge_crashes_off_pad() {
        let mut session = custom_session();
        let now = Instant::now();
        session.tick(now);
        session.release(Thruster::Main);
        // Footprint 684..716 hangs over the end of the pad at x=700
        place(&mut session, 700.0, 0.5, Vec2::new(0.0, -1.0));
        session.tick(now);
        session.tick(now);
        assert_eq!(session.end_state(), Some(EndOutcome::CrashOffPad));
    }

    #[test]
    fn test_landing_on_slope_crashes_off_pad() {
        let mut session = custom_session();
        let now = Instant::now();
        session.tick(now);
        session.release(Thruster::Main);
        session.flight.pos = Vec2::new(350.0, 55.0);
        session.flight.vel = Vec2::new(0.0, -1.0);
        session.tick(now);
        assert_eq!(session.phase(), GamePhase::EndGame);
        assert!(!session.contact().landed_flat());
        session.tick(now);
        assert_eq!(session.end_state(), Some(EndOutcome::CrashOffPad));
    }

    #[test]
    fn test_flying_away_is_out_of_range() {
        let mut session = custom_session();
        let now = Instant::now();
        session.tick(now);
        session.press(Thruster::Main);
        let ticks = tick_while(&mut session, GamePhase::Active, now);
        assert!(ticks > 1);
        assert_eq!(session.phase(), GamePhase::OutOfRange);
        assert!(session.telemetry().altitude > 5000.0);

        session.tick(now);
        assert_eq!(session.phase(), GamePhase::Inactive);
        assert_eq!(session.take_outcome(), Some(EndOutcome::OutOfRange));
        assert!(!session.flight().thrusters.any(), "flags cleared at the end");
    }

    #[test]
    fn test_free_fall_crashes_on_pad() {
        let mut session = custom_session();
        let now = Instant::now();
        session.tick(now);
        // Lander spawns over x=400, the left edge of the pad
        session.flight.pos.x = 550.0;
        session.release(Thruster::Main);
        tick_while(&mut session, GamePhase::Active, now);
        assert_eq!(session.phase(), GamePhase::EndGame);
        session.tick(now);
        assert_eq!(session.end_state(), Some(EndOutcome::CrashVertical));
    }

    #[test]
    fn test_restart_is_idempotent() {
        let mut session = custom_session();
        let now = Instant::now();
        session.tick(now);
        let terrain = session.terrain().clone();
        let initial = session.flight().clone();

        session.press(Thruster::Left);
        for _ in 0..5 {
            session.tick(now);
        }
        assert!(!session.restart(), "restart is rejected mid-flight");

        session.flight.pos.y = -1.0;
        tick_while(&mut session, GamePhase::Active, now);
        while session.phase() != GamePhase::Inactive {
            session.tick(now);
        }

        for _ in 0..3 {
            assert!(session.restart());
            assert_eq!(session.phase(), GamePhase::Hold);
            assert_eq!(session.flight(), &initial);
            assert_eq!(session.terrain(), &terrain);
            assert_eq!(session.end_state(), None);
        }
    }

    #[test]
    fn test_new_game_regenerates_terrain() {
        let mut session = Session::new(settings()).expect("valid settings");
        let first = session.terrain().clone();
        session.tick(Instant::now());
        session.press(Thruster::Main);
        session.start_new_game();
        assert_eq!(session.phase(), GamePhase::New);
        assert_ne!(session.terrain(), &first);
        assert!(!session.flight().thrusters.any());
        assert_eq!(session.flight().pos, session.terrain().spawn_position());
    }

    #[test]
    fn test_seeded_sessions_are_identical() {
        let run = || {
            let mut session = Session::new(settings()).expect("valid settings");
            let now = Instant::now();
            session.tick(now);
            session.press(Thruster::Main);
            for i in 0..40 {
                if i % 3 == 0 {
                    session.press(Thruster::Right);
                } else {
                    session.release(Thruster::Right);
                }
                session.tick(now);
            }
            (session.terrain().clone(), session.flight().clone())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_flames_follow_thrusters_while_fuel_lasts() {
        let mut session = custom_session();
        session.tick(Instant::now());
        session.press(Thruster::Main);
        assert!(session.telemetry().flames.main);

        session.flight.fuel = 0.0;
        assert!(!session.telemetry().flames.any());

        let mut session = Session::with_terrain(
            Settings {
                draw_flame: false,
                ..settings()
            },
            TerrainProfile::from_plot(&PLOT, &settings()).expect("plot has a pad"),
        )
        .expect("valid settings");
        session.tick(Instant::now());
        session.press(Thruster::Main);
        assert!(!session.telemetry().flames.any());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut session = custom_session();
        let now = Instant::now();
        session.tick(now);
        session.press(Thruster::Left);
        for _ in 0..3 {
            session.tick(now);
        }

        let snapshot = session.snapshot();
        let restored =
            Session::restore(settings(), session.terrain().clone(), &snapshot).expect("restorable");
        assert_eq!(restored.phase(), GamePhase::Active);
        assert_eq!(restored.flight().pos, session.flight().pos);
        assert_eq!(restored.flight().vel, session.flight().vel);
        assert_eq!(restored.flight().fuel, session.flight().fuel);
        assert!(!restored.flight().thrusters.any());
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn test_drop_to_ground_keeps_fraction() {
        assert_eq!(drop_to_ground(45.25, 30.0), 30.25);
        assert_eq!(drop_to_ground(30.5, 30.0), 30.5);
        assert_eq!(drop_to_ground(12.0, 30.0), 12.0);
        assert_eq!(drop_to_ground(5.5, 0.0), 0.5);
        assert_eq!(drop_to_ground(5.5, -3.0), -0.5);
        assert_eq!(drop_to_ground(1.0e9, 30.0), 30.0);
    }

    #[test]
    fn test_crash_drop_from_extreme_height_is_bounded() {
        let live = custom_session();
        let snapshot = SessionSnapshot {
            phase: GamePhase::Crash1,
            end_state: Some(EndOutcome::CrashVertical),
            pos: Vec2::new(550.0, 1.0e9),
            ..live.snapshot()
        };
        let mut session =
            Session::restore(settings(), live.terrain().clone(), &snapshot).expect("restorable");
        session.tick(Instant::now());
        assert_eq!(session.phase(), GamePhase::Crash2);
        assert_eq!(session.flight().pos.y, 30.0);
    }

    #[test]
    fn test_restore_rejects_crash_phase_without_outcome() {
        let live = custom_session();
        for phase in [GamePhase::Crash2, GamePhase::Crash3, GamePhase::Exploding] {
            let snapshot = SessionSnapshot {
                phase,
                end_state: None,
                ..live.snapshot()
            };
            assert!(matches!(
                Session::restore(settings(), live.terrain().clone(), &snapshot),
                Err(ConfigError::MissingOutcome(p)) if p == phase
            ));
        }
    }

    #[test]
    fn test_custom_terrain_must_fit_lander_and_field() {
        let narrow = TerrainProfile::from_plot(&PLOT, &settings()).expect("plot has a pad");
        let wide_lander = Settings {
            lander_width: 400,
            pad_size: 16,
            terrain_points: 31,
            ..settings()
        };
        assert!(matches!(
            Session::with_terrain(wide_lander, narrow.clone()),
            Err(ConfigError::PadNarrowerThanLander {
                pad_width: 300,
                lander_width: 400
            })
        ));

        let other_field = Settings {
            field_width: 1000,
            ..settings()
        };
        assert!(matches!(
            Session::with_terrain(other_field, narrow.clone()),
            Err(ConfigError::TerrainFieldMismatch { .. })
        ));

        let mut session = custom_session();
        session.tick(Instant::now());
        let small_field = Settings {
            field_width: 400,
            ..settings()
        };
        let foreign = TerrainProfile::from_plot(&PLOT, &small_field).expect("plot has a pad");
        assert!(session.start_custom_game(foreign).is_err());
        assert_eq!(session.phase(), GamePhase::Hold, "rejected terrain leaves the game alone");
        assert!(session.start_custom_game(narrow).is_ok());
        assert_eq!(session.phase(), GamePhase::New);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings {
            pad_size: 40,
            ..settings()
        };
        assert!(matches!(Session::new(settings), Err(ConfigError::PadSize { .. })));
    }
}
