//! Single-exercise phase state machine.
//!
//! [`PhaseClock`] is pure bookkeeping: it knows nothing about cues, wall-clock
//! time or stale ticks. Those concerns live in [`crate::engine`].
//!
//! ## State Transitions
//!
//! ```text
//! Prepare -> Work -> Rest -> Work ... -> CycleRest -> Work ... -> Finished
//! ```
//!
//! Leaving `Work` goes to `Rest` while rounds remain, to `CycleRest` while
//! cycles remain, and to `Finished` otherwise. Every phase lasts at least one
//! tick, even when configured with zero seconds.

use crate::cue::Cue;
use crate::ExerciseSpec;
use serde::{Deserialize, Serialize};

/// Countdown cues are emitted while this many seconds or fewer remain
pub const COUNTDOWN_CUE_SECONDS: u32 = 3;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Prepare,
    Work,
    Rest,
    CycleRest,
    Finished,
}

impl Phase {
    /// Upper-case display label
    pub fn label(self) -> &'static str {
        match self {
            Phase::Prepare => "PREPARE",
            Phase::Work => "WORK",
            Phase::Rest => "REST",
            Phase::CycleRest => "CYCLE REST",
            Phase::Finished => "FINISHED",
        }
    }

    /// Display color name
    pub fn color(self) -> &'static str {
        match self {
            Phase::Prepare => "blue",
            Phase::Work => "green",
            Phase::Rest => "orange",
            Phase::CycleRest => "purple",
            Phase::Finished => "gray",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Finished
    }
}

/// Phase lengths and repetition counts, in seconds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseTimings {
    pub prepare: u32,
    /// `None` when the work phase is ended by the user
    pub work: Option<u32>,
    pub rest: u32,
    pub rounds: u32,
    pub cycles: u32,
    pub cycle_rest: u32,
}

impl From<&ExerciseSpec> for PhaseTimings {
    fn from(spec: &ExerciseSpec) -> Self {
        Self {
            prepare: spec.prepare_time,
            work: spec.timed_work(),
            rest: spec.rest_time,
            rounds: spec.rounds.max(1),
            cycles: spec.cycles.max(1),
            cycle_rest: spec.rest_between_cycles,
        }
    }
}

/// Mutable playback state of one exercise
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct PhaseState {
    pub phase: Phase,
    /// Seconds left in the phase; always 0 during an untimed work phase
    pub time_remaining: u32,
    pub current_round: u32,
    pub current_cycle: u32,
    pub running: bool,
}

impl PhaseState {
    /// Inactive state before `start()` and after `reset()`
    pub fn baseline() -> Self {
        Self {
            phase: Phase::Prepare,
            time_remaining: 0,
            current_round: 1,
            current_cycle: 1,
            running: false,
        }
    }

    /// State right after `start()`
    pub fn initial(timings: &PhaseTimings) -> Self {
        Self {
            phase: Phase::Prepare,
            time_remaining: timings.prepare,
            current_round: 1,
            current_cycle: 1,
            running: true,
        }
    }
}

impl Default for PhaseState {
    fn default() -> Self {
        Self::baseline()
    }
}

/// A phase change, as reported to the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    /// Round and cycle after the transition
    pub round: u32,
    pub cycle: u32,
}

impl Transition {
    /// Cues announcing this transition, in the order they should sound
    pub fn cues(&self) -> Vec<Cue> {
        let mut cues = Vec::with_capacity(2);
        if self.from == Phase::Work {
            cues.push(Cue::WorkEnd);
        }
        match self.to {
            Phase::Work => cues.push(Cue::Go),
            Phase::Finished => cues.push(Cue::Finish),
            _ => {}
        }
        cues
    }
}

/// Result of a single tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing counted: stopped, finished, or an untimed work phase
    Idle,
    /// One second was taken off the current phase
    Counted { remaining: u32, countdown: bool },
    /// The current phase ran out
    Transition(Transition),
}

/// The state that follows `state` when its phase ends, or `None` from
/// `Finished`.
pub fn next_state(state: &PhaseState, timings: &PhaseTimings) -> Option<PhaseState> {
    let work_time = timings.work.unwrap_or(0);

    let next = match state.phase {
        Phase::Prepare | Phase::Rest | Phase::CycleRest => PhaseState {
            phase: Phase::Work,
            time_remaining: work_time,
            ..*state
        },
        Phase::Work => {
            if state.current_round < timings.rounds {
                PhaseState {
                    phase: Phase::Rest,
                    time_remaining: timings.rest,
                    current_round: state.current_round + 1,
                    ..*state
                }
            } else if timings.cycles > 1 && state.current_cycle < timings.cycles {
                PhaseState {
                    phase: Phase::CycleRest,
                    time_remaining: timings.cycle_rest,
                    current_round: 1,
                    current_cycle: state.current_cycle + 1,
                    ..*state
                }
            } else {
                PhaseState {
                    phase: Phase::Finished,
                    time_remaining: 0,
                    running: false,
                    ..*state
                }
            }
        }
        Phase::Finished => return None,
    };

    Some(next)
}

/// Countdown and phase bookkeeping for one exercise
#[derive(Clone, Debug)]
pub struct PhaseClock {
    timings: PhaseTimings,
    state: PhaseState,
    active: bool,
}

impl PhaseClock {
    pub fn new(timings: PhaseTimings) -> Self {
        Self {
            timings,
            state: PhaseState::baseline(),
            active: false,
        }
    }

    pub fn timings(&self) -> &PhaseTimings {
        &self.timings
    }

    pub fn state(&self) -> &PhaseState {
        &self.state
    }

    /// True between `start()` and `reset()`
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while in a work phase that only `advance()` can end
    pub fn awaiting_manual_completion(&self) -> bool {
        self.active && self.state.phase == Phase::Work && self.timings.work.is_none()
    }

    pub fn start(&mut self) {
        self.state = PhaseState::initial(&self.timings);
        self.active = true;
    }

    /// Stop counting. Returns false if already stopped.
    pub fn pause(&mut self) -> bool {
        if !self.state.running {
            return false;
        }
        self.state.running = false;
        true
    }

    /// Continue counting. Returns false if already running, not started, or
    /// finished.
    pub fn resume(&mut self) -> bool {
        if self.state.running || !self.active || self.state.phase.is_terminal() {
            return false;
        }
        self.state.running = true;
        true
    }

    pub fn reset(&mut self) {
        self.state = PhaseState::baseline();
        self.active = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.active || !self.state.running || self.awaiting_manual_completion() {
            return TickOutcome::Idle;
        }

        let remaining = self.state.time_remaining;
        if remaining <= 1 {
            return self
                .end_phase()
                .map(TickOutcome::Transition)
                .unwrap_or(TickOutcome::Idle);
        }

        self.state.time_remaining = remaining - 1;
        TickOutcome::Counted {
            remaining: self.state.time_remaining,
            countdown: remaining <= COUNTDOWN_CUE_SECONDS,
        }
    }

    /// End the current phase now, as if its countdown had reached zero.
    ///
    /// Works whether or not the clock is running; does nothing before
    /// `start()` or once finished.
    pub fn advance(&mut self) -> Option<Transition> {
        if !self.active {
            return None;
        }
        self.end_phase()
    }

    fn end_phase(&mut self) -> Option<Transition> {
        let from = self.state.phase;
        let next = next_state(&self.state, &self.timings)?;
        self.state = next;

        Some(Transition {
            from,
            to: next.phase,
            round: next.current_round,
            cycle: next.current_cycle,
        })
    }
}
