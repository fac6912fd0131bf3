//! Audio cue notifications.
//!
//! The engine never plays sound itself. It hands a [`Cue`] to an injected
//! [`CuePlayer`] and carries on; a player that fails only produces a warning.

use crate::{Error, Result};
use serde::Serialize;
use std::sync::Mutex;

/// Kinds of audible notification emitted during playback
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Short beep during the last seconds of a countdown
    Countdown,
    /// A work phase begins
    Go,
    /// A work phase ends
    WorkEnd,
    /// The exercise is finished
    Finish,
}

impl Cue {
    /// Suggested tone frequency for synthesizing the cue
    pub fn frequency_hz(self) -> u32 {
        match self {
            Cue::Countdown => 600,
            Cue::Go => 1000,
            Cue::WorkEnd => 800,
            Cue::Finish => 1200,
        }
    }

    /// Suggested tone length in milliseconds
    pub fn duration_ms(self) -> u32 {
        match self {
            Cue::Countdown => 100,
            Cue::Go => 300,
            Cue::WorkEnd => 200,
            Cue::Finish => 1000,
        }
    }
}

/// Capability to play cues, injected into the engine
pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: Cue) -> Result<()>;
}

/// Player that discards every cue
#[derive(Debug, Default)]
pub struct SilentCues;

impl CuePlayer for SilentCues {
    fn play(&self, _cue: Cue) -> Result<()> {
        Ok(())
    }
}

/// Player that only logs cues
#[derive(Debug, Default)]
pub struct LogCues;

impl CuePlayer for LogCues {
    fn play(&self, cue: Cue) -> Result<()> {
        tracing::debug!("Cue {:?} ({} Hz, {} ms)", cue, cue.frequency_hz(), cue.duration_ms());
        Ok(())
    }
}

/// Player that remembers every cue, for assertions and replays
#[derive(Debug, Default)]
pub struct RecordingCues {
    played: Mutex<Vec<Cue>>,
}

impl RecordingCues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cues played so far, oldest first
    pub fn played(&self) -> Vec<Cue> {
        self.played
            .lock()
            .map(|played| played.clone())
            .unwrap_or_default()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        if let Ok(mut played) = self.played.lock() {
            played.clear();
        }
    }
}

impl CuePlayer for RecordingCues {
    fn play(&self, cue: Cue) -> Result<()> {
        self.played
            .lock()
            .map_err(|_| Error::Cue("recording poisoned".into()))?
            .push(cue);
        Ok(())
    }
}

/// Hand a cue to the player, logging instead of propagating failures
pub(crate) fn emit(player: &dyn CuePlayer, cue: Cue) {
    if let Err(e) = player.play(cue) {
        tracing::warn!("Failed to play {:?} cue: {}", cue, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSpeaker;

    impl CuePlayer for BrokenSpeaker {
        fn play(&self, _cue: Cue) -> Result<()> {
            Err(Error::Cue("no audio device".into()))
        }
    }

    #[test]
    fn test_recording_keeps_order() {
        let cues = RecordingCues::new();
        cues.play(Cue::Go).unwrap();
        cues.play(Cue::WorkEnd).unwrap();

        assert_eq!(cues.played(), vec![Cue::Go, Cue::WorkEnd]);

        cues.clear();
        assert!(cues.played().is_empty());
    }

    #[test]
    fn test_emit_swallows_failures() {
        crate::logging::init_test();
        emit(&BrokenSpeaker, Cue::Finish);
    }

    #[test]
    fn test_tones_are_distinct() {
        let all = [Cue::Countdown, Cue::Go, Cue::WorkEnd, Cue::Finish];
        let mut freqs: Vec<u32> = all.iter().map(|c| c.frequency_hz()).collect();
        freqs.dedup();
        assert_eq!(freqs.len(), all.len());
    }
}
