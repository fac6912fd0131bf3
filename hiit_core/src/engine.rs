//! Exercise engine driving one exercise through its phases.
//!
//! The engine does not use internal threads; the caller is responsible for
//! calling `tick()` (or `on_tick()` with a ticket) once per second.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = ExerciseEngine::new(spec, Runtime::silent());
//! engine.start()?;
//! // In a loop, once per second:
//! let ticket = engine.ticket();
//! engine.on_tick(ticket);
//! ```

use crate::clock::{Clock, Stopwatch, SystemClock};
use crate::cue::{self, Cue, CuePlayer, SilentCues};
use crate::phase::{Phase, PhaseClock, PhaseState, PhaseTimings, TickOutcome, Transition};
use crate::tick::{TickGate, TickTicket};
use crate::{ExerciseSpec, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Collaborators injected into every engine
#[derive(Clone)]
pub struct Runtime {
    pub cues: Arc<dyn CuePlayer>,
    pub clock: Arc<dyn Clock>,
}

impl Runtime {
    pub fn new(cues: Arc<dyn CuePlayer>, clock: Arc<dyn Clock>) -> Self {
        Self { cues, clock }
    }

    /// Real clock, given cue player
    pub fn system(cues: Arc<dyn CuePlayer>) -> Self {
        Self::new(cues, Arc::new(SystemClock::new()))
    }

    /// Real clock, no cues
    pub fn silent() -> Self {
        Self::system(Arc::new(SilentCues))
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime").finish_non_exhaustive()
    }
}

/// Something that happened inside the engine
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Started,
    PhaseChanged {
        from: Phase,
        to: Phase,
        round: u32,
        cycle: u32,
    },
    /// A manual work phase was completed by the user
    SetCompleted {
        round: u32,
        cycle: u32,
        duration: Duration,
    },
    Finished,
}

/// Read-only view for rendering
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct EngineSnapshot {
    pub phase: Phase,
    pub label: &'static str,
    pub color: &'static str,
    pub time_remaining: u32,
    pub current_round: u32,
    pub total_rounds: u32,
    pub current_cycle: u32,
    pub total_cycles: u32,
    pub running: bool,
    pub active: bool,
    /// True while waiting for the user to complete a manual set
    pub manual_work: bool,
    /// Whole seconds spent in the current manual work phase
    pub exercise_duration: u64,
}

/// Plays one [`ExerciseSpec`]
#[derive(Debug)]
pub struct ExerciseEngine {
    spec: ExerciseSpec,
    clock: PhaseClock,
    runtime: Runtime,
    gate: TickGate,
    stopwatch: Stopwatch,
}

impl ExerciseEngine {
    pub fn new(spec: ExerciseSpec, runtime: Runtime) -> Self {
        let clock = PhaseClock::new(PhaseTimings::from(&spec));
        Self {
            spec,
            clock,
            runtime,
            gate: TickGate::default(),
            stopwatch: Stopwatch::default(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn spec(&self) -> &ExerciseSpec {
        &self.spec
    }

    pub fn state(&self) -> &PhaseState {
        self.clock.state()
    }

    pub fn phase(&self) -> Phase {
        self.clock.state().phase
    }

    pub fn is_active(&self) -> bool {
        self.clock.is_active()
    }

    pub fn is_running(&self) -> bool {
        self.clock.state().running
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_active() && self.phase() == Phase::Finished
    }

    /// True while the work phase waits for `advance()`
    pub fn awaiting_manual_completion(&self) -> bool {
        self.clock.awaiting_manual_completion()
    }

    /// Time spent in the current manual work phase, excluding pauses
    pub fn exercise_duration(&self) -> Duration {
        self.stopwatch.elapsed(self.runtime.clock.now())
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.clock.state();
        EngineSnapshot {
            phase: state.phase,
            label: state.phase.label(),
            color: state.phase.color(),
            time_remaining: state.time_remaining,
            current_round: state.current_round,
            total_rounds: self.clock.timings().rounds,
            current_cycle: state.current_cycle,
            total_cycles: self.clock.timings().cycles,
            running: state.running,
            active: self.clock.is_active(),
            manual_work: self.awaiting_manual_completion(),
            exercise_duration: self.exercise_duration().as_secs(),
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Start (or restart) from the prepare phase.
    ///
    /// The configuration is validated first; on error nothing changes.
    pub fn start(&mut self) -> Result<Vec<EngineEvent>> {
        self.spec.validate()?;

        self.gate.invalidate();
        self.stopwatch.reset();
        self.clock.start();

        tracing::debug!(
            "Exercise started: {:?}, {} round(s) x {} cycle(s)",
            self.spec.mode,
            self.spec.rounds,
            self.spec.cycles
        );
        Ok(vec![EngineEvent::Started])
    }

    /// Stop counting. Returns false if nothing changed.
    pub fn pause(&mut self) -> bool {
        if !self.clock.pause() {
            return false;
        }
        self.gate.invalidate();
        self.stopwatch.pause(self.runtime.clock.now());
        tracing::debug!("Exercise paused in {:?}", self.phase());
        true
    }

    /// Continue counting. Returns false if nothing changed.
    pub fn resume(&mut self) -> bool {
        if !self.clock.resume() {
            return false;
        }
        self.gate.invalidate();
        if self.awaiting_manual_completion() {
            self.stopwatch.resume(self.runtime.clock.now());
        }
        tracing::debug!("Exercise resumed in {:?}", self.phase());
        true
    }

    /// Return to the inactive baseline, cancelling outstanding ticks
    pub fn reset(&mut self) {
        self.gate.invalidate();
        self.clock.reset();
        self.stopwatch.reset();
        tracing::debug!("Exercise reset");
    }

    /// End the current phase immediately. No-op when finished or idle.
    pub fn advance(&mut self) -> Vec<EngineEvent> {
        let before = *self.clock.state();
        let duration = self.exercise_duration();

        let Some(transition) = self.clock.advance() else {
            return Vec::new();
        };
        self.gate.invalidate();
        self.apply(before, duration, transition)
    }

    /// Ticket for the next scheduled tick
    pub fn ticket(&self) -> TickTicket {
        self.gate.issue()
    }

    /// Deliver a scheduled tick; stale tickets are ignored
    pub fn on_tick(&mut self, ticket: TickTicket) -> Vec<EngineEvent> {
        if !self.gate.admits(ticket) {
            tracing::trace!("Ignoring stale exercise tick");
            return Vec::new();
        }
        self.tick()
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) -> Vec<EngineEvent> {
        let before = *self.clock.state();
        let duration = self.exercise_duration();

        match self.clock.tick() {
            TickOutcome::Idle => Vec::new(),
            TickOutcome::Counted { countdown, .. } => {
                if countdown {
                    cue::emit(self.runtime.cues.as_ref(), Cue::Countdown);
                }
                Vec::new()
            }
            TickOutcome::Transition(transition) => self.apply(before, duration, transition),
        }
    }

    fn apply(&mut self, before: PhaseState, duration: Duration, t: Transition) -> Vec<EngineEvent> {
        let mut events = Vec::with_capacity(3);

        if t.from == Phase::Work && self.spec.is_manual() {
            tracing::info!(
                "Manual set completed in {}s (round {}, cycle {})",
                duration.as_secs(),
                before.current_round,
                before.current_cycle
            );
            events.push(EngineEvent::SetCompleted {
                round: before.current_round,
                cycle: before.current_cycle,
                duration,
            });
        }

        for c in t.cues() {
            cue::emit(self.runtime.cues.as_ref(), c);
        }

        let now = self.runtime.clock.now();
        if self.awaiting_manual_completion() {
            self.stopwatch.restart(now);
            if !self.is_running() {
                self.stopwatch.pause(now);
            }
        } else {
            self.stopwatch.reset();
        }

        tracing::debug!(
            "Phase {:?} -> {:?} (round {}, cycle {})",
            t.from,
            t.to,
            t.round,
            t.cycle
        );
        events.push(EngineEvent::PhaseChanged {
            from: t.from,
            to: t.to,
            round: t.round,
            cycle: t.cycle,
        });

        if t.to == Phase::Finished {
            events.push(EngineEvent::Finished);
        }
        events
    }
}

/// Format whole seconds as `MM:SS`
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
