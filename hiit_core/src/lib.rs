#![forbid(unsafe_code)]

//! Core playback logic for the HIIT interval timer.
//!
//! This crate provides:
//! - Domain types (exercises, groups, programs)
//! - The per-exercise phase state machine and engine
//! - The program scheduler that sequences exercises and rests
//! - Injectable cue and clock seams
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod cue;
pub mod clock;
pub mod tick;
pub mod phase;
pub mod engine;
pub mod program;
pub mod scheduler;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use cue::{Cue, CuePlayer};
pub use clock::{Clock, SystemClock};
pub use tick::TickTicket;
pub use phase::{Phase, PhaseState};
pub use engine::{format_clock, EngineEvent, EngineSnapshot, ExerciseEngine, Runtime};
pub use scheduler::{ProgramEvent, ProgramScheduler, ProgramSnapshot, RestKind};
