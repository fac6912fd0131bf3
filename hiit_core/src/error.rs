//! Error types for the hiit_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for hiit_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Application settings could not be written
    #[error("Settings error: {0}")]
    Settings(String),

    /// An exercise is missing a required field or has an out-of-range value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A program was started without anything to play
    #[error("Program has no playable items")]
    EmptyProgram,

    /// Program playback stopped before completing
    #[error("Playback halted: {0}")]
    Halted(String),

    /// A cue player failed to deliver a cue
    #[error("Cue error: {0}")]
    Cue(String),
}
