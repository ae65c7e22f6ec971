//! End-of-game text
//!
//! The presentation layer shows one dialog per finished game. Crashes share a
//! title and get a reason line; a vertical crash picks one of several lines.

use std::fmt;

use rand::Rng;

use crate::sim::EndOutcome;

const VERTICAL_CRASH_LINES: [&str; 3] = [
    "You just dug a new crater.",
    "The lander is now a lot shorter.",
    "Pieces of the lander were found scattered across the pad.",
];

/// Title and body for the end-of-game dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndMessage {
    pub title: &'static str,
    pub body: &'static str,
}

impl fmt::Display for EndMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.title, self.body)
    }
}

/// Pick the dialog text for an outcome
pub fn end_message<R: Rng>(outcome: EndOutcome, rng: &mut R) -> EndMessage {
    let crash = "Crash!";
    match outcome {
        EndOutcome::Safe => EndMessage {
            title: "Safe landing!",
            body: "The Eagle has landed.",
        },
        EndOutcome::OutOfRange => EndMessage {
            title: "Out of range",
            body: "The lander drifted beyond radar range and was lost.",
        },
        EndOutcome::CrashVertical => EndMessage {
            title: crash,
            body: VERTICAL_CRASH_LINES[rng.random_range(0..VERTICAL_CRASH_LINES.len())],
        },
        EndOutcome::CrashHorizontal => EndMessage {
            title: crash,
            body: "Too much sideways speed, the lander tipped over.",
        },
        EndOutcome::CrashAngle => EndMessage {
            title: crash,
            body: "The lander came down at too steep an angle.",
        },
        EndOutcome::CrashOffPad => EndMessage {
            title: crash,
            body: "You missed the landing pad.",
        },
    }
}
