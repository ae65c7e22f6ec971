//! Fixed-cadence tick thread for one session
//!
//! The session lives behind a single mutex. The tick thread takes the lock
//! once per interval; commands and telemetry reads from other threads take the
//! same lock, so a command is never seen half-way through a tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use thiserror::Error;

use crate::settings::ConfigError;
use crate::sim::{EndOutcome, Session, Telemetry, TerrainProfile, Thruster};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to spawn tick thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("tick thread panicked")]
    ThreadPanic,
}

/// Cloneable command/telemetry access to a driven session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<Session>>,
}

impl SessionHandle {
    /// Lock the session, recovering from a panicked holder
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start_new_game(&self) {
        self.lock().start_new_game();
    }

    pub fn start_custom_game(&self, terrain: TerrainProfile) -> Result<(), ConfigError> {
        self.lock().start_custom_game(terrain)
    }

    pub fn restart(&self) -> bool {
        self.lock().restart()
    }

    pub fn set_control(&self, thruster: Thruster, pressed: bool) -> bool {
        self.lock().set_control(thruster, pressed)
    }

    pub fn press(&self, thruster: Thruster) -> bool {
        self.set_control(thruster, true)
    }

    pub fn release(&self, thruster: Thruster) -> bool {
        self.set_control(thruster, false)
    }

    pub fn telemetry(&self) -> Telemetry {
        self.lock().telemetry()
    }

    /// Run a closure against the locked session
    pub fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        f(&mut self.lock())
    }
}

/// Owns the tick thread
pub struct SessionDriver {
    handle: SessionHandle,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    outcomes: Receiver<EndOutcome>,
}

impl SessionDriver {
    /// Start ticking `session` every `interval`
    pub fn spawn(session: Session, interval: Duration) -> Result<Self, DriverError> {
        let handle = SessionHandle {
            session: Arc::new(Mutex::new(session)),
        };
        let running = Arc::new(AtomicBool::new(true));
        let (sender, outcomes) = unbounded();

        let thread = {
            let handle = handle.clone();
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("lander-tick".into())
                .spawn(move || run(handle, running, sender, interval))?
        };

        log::info!("Tick thread started ({:?} interval)", interval);
        Ok(Self {
            handle,
            running,
            thread: Some(thread),
            outcomes,
        })
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Receiver for end-of-game outcomes, one per finished game
    pub fn outcomes(&self) -> &Receiver<EndOutcome> {
        &self.outcomes
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the tick thread and wait for it to exit
    pub fn stop(&mut self) -> Result<(), DriverError> {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| DriverError::ThreadPanic)?;
            log::info!("Tick thread stopped");
        }
        Ok(())
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("{}", e);
        }
    }
}

fn run(handle: SessionHandle, running: Arc<AtomicBool>, outcomes: Sender<EndOutcome>, interval: Duration) {
    while running.load(Ordering::Acquire) {
        let started = Instant::now();

        let outcome = {
            let mut session = handle.lock();
            session.tick(started);
            session.take_outcome()
        };
        if let Some(outcome) = outcome {
            // Nobody listening is fine; the outcome is also in telemetry
            let _ = outcomes.send(outcome);
        }

        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }
}
