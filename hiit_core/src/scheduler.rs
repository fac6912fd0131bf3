//! Program playback scheduler.
//!
//! Sequences the items of a [`Program`] into one playback run. The scheduler
//! owns at most one [`ExerciseEngine`] at a time, forwards ticks to it, and
//! decides what follows when it finishes: another round, a rest, the next
//! item, or the end of the program.
//!
//! ```text
//! Idle -> Exercise -> (RestBetweenExercises | RestBetweenItems) -> Exercise ... -> Finished
//! ```

use crate::engine::{EngineEvent, EngineSnapshot, ExerciseEngine, Runtime};
use crate::tick::{TickGate, TickTicket};
use crate::{Error, Exercise, Program, ProgramItem, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Position of playback inside the program tree
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct PlaybackCursor {
    pub item_index: usize,
    /// Always 0 for standalone items
    pub exercise_index: usize,
    /// Round of the item itself, independent of the exercise's own rounds
    pub item_round: u32,
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self {
            item_index: 0,
            exercise_index: 0,
            item_round: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RestKind {
    BetweenExercises,
    BetweenItems,
}

/// What the scheduler is doing right now. Exactly one holds at any time.
#[derive(Debug)]
pub enum Activity {
    Idle,
    Exercise(Box<ExerciseEngine>),
    RestBetweenExercises { remaining: u32 },
    RestBetweenItems { remaining: u32 },
    Finished,
}

impl Activity {
    fn rest(&self) -> Option<(RestKind, u32)> {
        match self {
            Activity::RestBetweenExercises { remaining } => {
                Some((RestKind::BetweenExercises, *remaining))
            }
            Activity::RestBetweenItems { remaining } => Some((RestKind::BetweenItems, *remaining)),
            _ => None,
        }
    }

    fn resting(kind: RestKind, remaining: u32) -> Self {
        match kind {
            RestKind::BetweenExercises => Activity::RestBetweenExercises { remaining },
            RestKind::BetweenItems => Activity::RestBetweenItems { remaining },
        }
    }
}

/// Something that happened during program playback
#[derive(Clone, Debug, PartialEq)]
pub enum ProgramEvent {
    ProgramStarted {
        items: usize,
    },
    ExerciseStarted {
        item_index: usize,
        exercise_index: usize,
        item_round: u32,
        name: String,
    },
    /// Forwarded from the active engine
    Exercise(EngineEvent),
    RestStarted {
        kind: RestKind,
        seconds: u32,
    },
    RestEnded {
        kind: RestKind,
        skipped: bool,
    },
    /// An empty group was passed over
    ItemSkipped {
        item_index: usize,
    },
    ProgramCompleted {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
    /// Playback stopped on an unrecoverable error
    Halted {
        reason: String,
    },
}

/// Rest countdown as shown to the user
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RestSnapshot {
    pub kind: RestKind,
    pub remaining: u32,
    /// Exercise that plays when the rest ends
    pub up_next: Option<String>,
}

/// Read-only view of the whole playback for rendering
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProgramSnapshot {
    pub program_name: Option<String>,
    pub cursor: PlaybackCursor,
    pub item_count: usize,
    pub item_rounds: u32,
    /// Number of exercises in the current group, `None` for standalone items
    pub group_size: Option<usize>,
    pub exercise_name: Option<String>,
    pub exercise: Option<EngineSnapshot>,
    pub rest: Option<RestSnapshot>,
    pub paused: bool,
    pub finished: bool,
}

/// Copy of the current item's shape, taken before mutating the cursor
struct ItemShape {
    rounds: u32,
    group: Option<(usize, u32)>,
}

/// Plays a [`Program`] one exercise at a time
#[derive(Debug)]
pub struct ProgramScheduler {
    runtime: Runtime,
    program: Option<Program>,
    cursor: PlaybackCursor,
    activity: Activity,
    paused: bool,
    gate: TickGate,
    started_at: Option<DateTime<Utc>>,
}

impl ProgramScheduler {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            runtime,
            program: None,
            cursor: PlaybackCursor::default(),
            activity: Activity::Idle,
            paused: false,
            gate: TickGate::default(),
            started_at: None,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.activity, Activity::Finished)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.activity, Activity::Idle)
    }

    /// The active engine, if an exercise is playing
    pub fn engine(&self) -> Option<&ExerciseEngine> {
        match &self.activity {
            Activity::Exercise(engine) => Some(engine),
            _ => None,
        }
    }

    /// Rest kind and seconds left, if resting
    pub fn rest(&self) -> Option<(RestKind, u32)> {
        self.activity.rest()
    }

    pub fn current_item(&self) -> Option<&ProgramItem> {
        self.program.as_ref()?.items.get(self.cursor.item_index)
    }

    /// Exercise under the cursor; during a rest this is the one up next
    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.current_item()?.exercise_at(self.cursor.exercise_index)
    }

    pub fn awaiting_manual_completion(&self) -> bool {
        self.engine()
            .map(|e| e.awaiting_manual_completion())
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> ProgramSnapshot {
        let item = self.current_item();
        ProgramSnapshot {
            program_name: self.program.as_ref().map(|p| p.name.clone()),
            cursor: self.cursor,
            item_count: self.program.as_ref().map(|p| p.items.len()).unwrap_or(0),
            item_rounds: item.map(|i| i.rounds()).unwrap_or(0),
            group_size: item.filter(|i| i.is_group()).map(|i| i.exercises().len()),
            exercise_name: self.current_exercise().map(|e| e.name.clone()),
            exercise: self.engine().map(|e| e.snapshot()),
            rest: self.rest().map(|(kind, remaining)| RestSnapshot {
                kind,
                remaining,
                up_next: self.current_exercise().map(|e| e.name.clone()),
            }),
            paused: self.paused,
            finished: self.is_finished(),
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Begin playing `program` from its first playable exercise.
    ///
    /// Fails with [`Error::EmptyProgram`] when there is nothing to play and
    /// with [`Error::Configuration`] when any exercise is invalid; in both
    /// cases the scheduler is left untouched.
    pub fn start_program(&mut self, program: Program) -> Result<Vec<ProgramEvent>> {
        program.validate()?;
        let Some(first) = program.items.iter().position(|item| !item.is_empty()) else {
            return Err(Error::EmptyProgram);
        };

        self.activity = Activity::Idle;
        self.gate.invalidate();
        self.paused = false;
        self.cursor = PlaybackCursor {
            item_index: first,
            ..PlaybackCursor::default()
        };
        self.started_at = Some(Utc::now());

        tracing::info!(
            "Starting program '{}' with {} item(s)",
            program.name,
            program.items.len()
        );
        let mut events = vec![ProgramEvent::ProgramStarted {
            items: program.items.len(),
        }];
        self.program = Some(program);
        self.begin_current(&mut events);
        Ok(events)
    }

    /// Freeze playback, whether an exercise or a rest is running.
    /// Returns false if nothing changed.
    pub fn pause_program(&mut self) -> bool {
        if self.paused {
            return false;
        }
        match &mut self.activity {
            Activity::Exercise(engine) => {
                engine.pause();
            }
            Activity::RestBetweenExercises { .. } | Activity::RestBetweenItems { .. } => {}
            Activity::Idle | Activity::Finished => return false,
        }
        self.paused = true;
        self.gate.invalidate();
        tracing::debug!("Program paused");
        true
    }

    /// Continue after `pause_program`. Returns false if nothing changed.
    pub fn resume_program(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        if let Activity::Exercise(engine) = &mut self.activity {
            engine.resume();
        }
        self.paused = false;
        self.gate.invalidate();
        tracing::debug!("Program resumed");
        true
    }

    /// End the current rest now and start the next exercise. No-op when not
    /// resting.
    pub fn skip_rest(&mut self) -> Vec<ProgramEvent> {
        let Some((kind, _)) = self.activity.rest() else {
            return Vec::new();
        };
        self.gate.invalidate();
        self.paused = false;

        let mut events = Vec::new();
        self.end_rest(kind, true, &mut events);
        events
    }

    /// Pass-through to the active engine's `advance()`
    pub fn advance_exercise(&mut self) -> Vec<ProgramEvent> {
        let Activity::Exercise(engine) = &mut self.activity else {
            return Vec::new();
        };
        let engine_events = engine.advance();
        if engine_events.is_empty() {
            return Vec::new();
        }
        self.gate.invalidate();

        let mut events = Vec::new();
        self.absorb(engine_events, &mut events);
        events
    }

    /// Stop playback and return to idle
    pub fn cancel(&mut self) {
        self.activity = Activity::Idle;
        self.program = None;
        self.cursor = PlaybackCursor::default();
        self.paused = false;
        self.started_at = None;
        self.gate.invalidate();
        tracing::info!("Program playback cancelled");
    }

    /// Ticket for the next scheduled tick
    pub fn ticket(&self) -> TickTicket {
        self.gate.issue()
    }

    /// Deliver a scheduled tick; stale tickets are ignored
    pub fn on_tick(&mut self, ticket: TickTicket) -> Vec<ProgramEvent> {
        if !self.gate.admits(ticket) {
            tracing::trace!("Ignoring stale program tick");
            return Vec::new();
        }
        self.tick()
    }

    /// One second of playback
    pub fn tick(&mut self) -> Vec<ProgramEvent> {
        if self.paused {
            return Vec::new();
        }

        let mut events = Vec::new();
        match &mut self.activity {
            Activity::Exercise(engine) => {
                let engine_events = engine.tick();
                self.absorb(engine_events, &mut events);
            }
            Activity::RestBetweenExercises { remaining } | Activity::RestBetweenItems { remaining } => {
                if *remaining <= 1 {
                    if let Some((kind, _)) = self.activity.rest() {
                        self.end_rest(kind, false, &mut events);
                    }
                } else {
                    *remaining -= 1;
                }
            }
            Activity::Idle | Activity::Finished => {}
        }
        events
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    fn absorb(&mut self, engine_events: Vec<EngineEvent>, out: &mut Vec<ProgramEvent>) {
        let finished = engine_events.contains(&EngineEvent::Finished);
        out.extend(engine_events.into_iter().map(ProgramEvent::Exercise));
        if finished {
            self.on_exercise_complete(out);
        }
    }

    fn item_shape(&self) -> Option<ItemShape> {
        let item = self.current_item()?;
        Some(match item {
            ProgramItem::Standalone { rounds, .. } => ItemShape {
                rounds: *rounds,
                group: None,
            },
            ProgramItem::Group(group) => ItemShape {
                rounds: group.rounds,
                group: Some((group.exercises.len(), group.rest_between_exercises)),
            },
        })
    }

    fn on_exercise_complete(&mut self, out: &mut Vec<ProgramEvent>) {
        let Some(shape) = self.item_shape() else {
            self.halt("active item disappeared", out);
            return;
        };

        match shape.group {
            None => {
                if self.cursor.item_round < shape.rounds {
                    self.cursor.item_round += 1;
                    self.begin_current(out);
                } else {
                    self.advance_item(out);
                }
            }
            Some((len, rest)) => {
                let last_in_group = self.cursor.exercise_index + 1 >= len;
                if !last_in_group {
                    self.cursor.exercise_index += 1;
                    self.enter_rest(RestKind::BetweenExercises, rest, out);
                } else if self.cursor.item_round < shape.rounds {
                    self.cursor.item_round += 1;
                    self.cursor.exercise_index = 0;
                    self.enter_rest(RestKind::BetweenExercises, rest, out);
                } else {
                    self.advance_item(out);
                }
            }
        }
    }

    /// Move past the current item. Empty groups in between are skipped
    /// without a rest of their own; with nothing playable left the program
    /// completes at once.
    fn advance_item(&mut self, out: &mut Vec<ProgramEvent>) {
        let Some(program) = self.program.as_ref() else {
            return;
        };
        let rest_between_items = program.rest_between_items;

        let mut next = self.cursor.item_index + 1;
        while let Some(item) = program.items.get(next) {
            if !item.is_empty() {
                break;
            }
            tracing::debug!("Skipping empty group at item {}", next);
            out.push(ProgramEvent::ItemSkipped { item_index: next });
            next += 1;
        }

        if next >= program.items.len() {
            self.activity = Activity::Finished;
            self.paused = false;
            self.gate.invalidate();

            let finished_at = Utc::now();
            let started_at = self.started_at.unwrap_or(finished_at);
            tracing::info!(
                "Program '{}' complete after {}s",
                program.name,
                (finished_at - started_at).num_seconds()
            );
            out.push(ProgramEvent::ProgramCompleted {
                started_at,
                finished_at,
            });
            return;
        }

        self.cursor = PlaybackCursor {
            item_index: next,
            ..PlaybackCursor::default()
        };
        self.enter_rest(RestKind::BetweenItems, rest_between_items, out);
    }

    fn enter_rest(&mut self, kind: RestKind, seconds: u32, out: &mut Vec<ProgramEvent>) {
        // Drops the finished engine
        self.activity = Activity::resting(kind, seconds);
        tracing::debug!("Rest {:?} for {}s", kind, seconds);
        out.push(ProgramEvent::RestStarted { kind, seconds });
    }

    fn end_rest(&mut self, kind: RestKind, skipped: bool, out: &mut Vec<ProgramEvent>) {
        self.activity = Activity::Idle;
        out.push(ProgramEvent::RestEnded { kind, skipped });
        self.begin_current(out);
    }

    /// Start an engine for the exercise under the cursor
    fn begin_current(&mut self, out: &mut Vec<ProgramEvent>) {
        // The previous engine is torn down before the next one exists
        self.activity = Activity::Idle;

        let Some(item) = self.current_item() else {
            self.halt("cursor points past the last item", out);
            return;
        };
        let Some(exercise) = item.exercise_at(self.cursor.exercise_index).cloned() else {
            self.halt("exercise index out of range", out);
            return;
        };

        let mut engine = ExerciseEngine::new(exercise.spec, self.runtime.clone());
        let started = match engine.start() {
            Ok(events) => events,
            Err(e) => {
                self.halt(&e.to_string(), out);
                return;
            }
        };
        if self.paused {
            engine.pause();
        }

        tracing::info!(
            "Exercise '{}' (item {}, exercise {}, round {})",
            exercise.name,
            self.cursor.item_index + 1,
            self.cursor.exercise_index + 1,
            self.cursor.item_round
        );
        out.push(ProgramEvent::ExerciseStarted {
            item_index: self.cursor.item_index,
            exercise_index: self.cursor.exercise_index,
            item_round: self.cursor.item_round,
            name: exercise.name,
        });
        out.extend(started.into_iter().map(ProgramEvent::Exercise));
        self.activity = Activity::Exercise(Box::new(engine));
    }

    fn halt(&mut self, reason: &str, out: &mut Vec<ProgramEvent>) {
        tracing::error!("Program playback halted: {}", reason);
        self.cancel();
        out.push(ProgramEvent::Halted {
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::cue::{Cue, RecordingCues};
    use crate::phase::Phase;
    use crate::ExerciseSpec;
    use std::sync::Arc;

    /// Coarse playback milestones, for comparing orderings
    #[derive(Debug, PartialEq)]
    enum Step {
        Play(&'static str),
        Rest(RestKind, u32),
        Skipped(usize),
        Done,
    }

    fn quick(name: &str) -> Exercise {
        // 1 + 3 = 4 ticks
        Exercise::new(name, ExerciseSpec::timed(1, 3))
    }

    fn runtime() -> (Runtime, Arc<RecordingCues>) {
        let cues = Arc::new(RecordingCues::new());
        let runtime = Runtime::new(cues.clone(), Arc::new(ManualClock::new()));
        (runtime, cues)
    }

    fn program(items: Vec<ProgramItem>, rest_between_items: u32) -> Program {
        Program {
            rest_between_items,
            ..Program::new("Test", items)
        }
    }

    fn steps(events: &[ProgramEvent], names: &[&'static str], out: &mut Vec<Step>) {
        for event in events {
            match event {
                ProgramEvent::ExerciseStarted { name, .. } => {
                    let known = names.iter().find(|n| **n == name.as_str()).copied();
                    out.push(Step::Play(known.unwrap_or("?")));
                }
                ProgramEvent::RestStarted { kind, seconds } => out.push(Step::Rest(*kind, *seconds)),
                ProgramEvent::ItemSkipped { item_index } => out.push(Step::Skipped(*item_index)),
                ProgramEvent::ProgramCompleted { .. } => out.push(Step::Done),
                _ => {}
            }
        }
    }

    /// Run to completion, returning the milestones and the tick count
    fn play(program: Program, names: &[&'static str]) -> (Vec<Step>, u64) {
        crate::logging::init_test();
        let (runtime, _) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);
        let mut out = Vec::new();

        let events = scheduler.start_program(program).unwrap();
        steps(&events, names, &mut out);

        let mut ticks = 0;
        while !scheduler.is_finished() {
            let events = scheduler.tick();
            steps(&events, names, &mut out);
            ticks += 1;
            assert!(ticks < 100_000, "program never finished");
        }
        (out, ticks)
    }

    #[test]
    fn test_scenario_group_rounds() {
        let group = ProgramItem::group(vec![quick("E1"), quick("E2")], 2, 10);
        let (out, ticks) = play(program(vec![group], 20), &["E1", "E2"]);

        use RestKind::BetweenExercises as Ex;
        assert_eq!(
            out,
            vec![
                Step::Play("E1"),
                Step::Rest(Ex, 10),
                Step::Play("E2"),
                Step::Rest(Ex, 10),
                Step::Play("E1"),
                Step::Rest(Ex, 10),
                Step::Play("E2"),
                Step::Done,
            ]
        );
        assert_eq!(ticks, 4 * 4 + 3 * 10);
    }

    #[test]
    fn test_empty_program_rejected() {
        let (runtime, _) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);

        let err = scheduler.start_program(program(vec![], 5)).unwrap_err();
        assert!(matches!(err, Error::EmptyProgram));
        assert!(scheduler.engine().is_none());
        assert!(scheduler.is_idle());

        let only_empty_groups = program(vec![ProgramItem::group(vec![], 1, 0)], 5);
        assert!(matches!(
            scheduler.start_program(only_empty_groups),
            Err(Error::EmptyProgram)
        ));
        assert!(scheduler.program().is_none());
    }

    #[test]
    fn test_invalid_exercise_rejected_before_playing() {
        let (runtime, cues) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);

        let mut broken = quick("Broken");
        broken.spec.work_time = None;
        let items = vec![
            ProgramItem::standalone(quick("Fine"), 1),
            ProgramItem::standalone(broken, 1),
        ];

        let err = scheduler.start_program(program(items, 0)).unwrap_err();
        assert!(err.to_string().contains("Broken"));
        assert!(scheduler.is_idle());
        assert!(cues.played().is_empty());
    }

    #[test]
    fn test_standalone_rounds_restart_without_rest() {
        let items = vec![
            ProgramItem::standalone(quick("A"), 3),
            ProgramItem::standalone(quick("B"), 1),
        ];
        let (out, ticks) = play(program(items, 7), &["A", "B"]);

        assert_eq!(
            out,
            vec![
                Step::Play("A"),
                Step::Play("A"),
                Step::Play("A"),
                Step::Rest(RestKind::BetweenItems, 7),
                Step::Play("B"),
                Step::Done,
            ]
        );
        assert_eq!(ticks, 3 * 4 + 7 + 4);
    }

    #[test]
    fn test_tick_count_matches_program_estimate() {
        let items = vec![
            ProgramItem::standalone(
                Exercise::new("Jacks", ExerciseSpec::timed(3, 20).with_rest(5).with_rounds(2)),
                2,
            ),
            ProgramItem::group(vec![quick("E1"), quick("E2"), quick("E3")], 2, 0),
            ProgramItem::standalone(quick("Cooldown"), 1),
        ];
        let p = program(items, 15);
        let expected = p.estimated_ticks().unwrap();

        let (_, ticks) = play(p, &[]);
        assert_eq!(ticks, expected);
    }

    #[test]
    fn test_empty_group_skipped_during_traversal() {
        let items = vec![
            ProgramItem::group(vec![], 1, 0),
            ProgramItem::standalone(quick("A"), 1),
            ProgramItem::group(vec![], 2, 5),
            ProgramItem::standalone(quick("B"), 1),
        ];
        let (out, _) = play(program(items, 2), &["A", "B"]);

        assert_eq!(
            out,
            vec![
                Step::Play("A"),
                Step::Skipped(2),
                Step::Rest(RestKind::BetweenItems, 2),
                Step::Play("B"),
                Step::Done,
            ]
        );
    }

    #[test]
    fn test_trailing_empty_group_completes_without_rest() {
        let items = vec![
            ProgramItem::standalone(quick("A"), 1),
            ProgramItem::group(vec![], 1, 0),
        ];
        let p = program(items, 20);
        assert_eq!(p.estimated_ticks(), Some(4));

        let (out, ticks) = play(p, &["A"]);
        assert_eq!(out, vec![Step::Play("A"), Step::Skipped(1), Step::Done]);
        assert_eq!(ticks, 4);
    }

    #[test]
    fn test_empty_group_between_items_costs_one_rest() {
        let items = vec![
            ProgramItem::standalone(quick("A"), 1),
            ProgramItem::group(vec![], 1, 0),
            ProgramItem::group(vec![], 3, 5),
            ProgramItem::standalone(quick("B"), 1),
        ];
        let p = program(items, 20);
        assert_eq!(p.estimated_ticks(), Some(4 + 20 + 4));

        let (out, ticks) = play(p, &["A", "B"]);
        assert_eq!(
            out,
            vec![
                Step::Play("A"),
                Step::Skipped(1),
                Step::Skipped(2),
                Step::Rest(RestKind::BetweenItems, 20),
                Step::Play("B"),
                Step::Done,
            ]
        );
        assert_eq!(ticks, 28);
    }

    #[test]
    fn test_zero_length_rest_takes_one_tick() {
        let group = ProgramItem::group(vec![quick("E1"), quick("E2")], 1, 0);
        let (runtime, _) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);
        scheduler.start_program(program(vec![group], 0)).unwrap();

        for _ in 0..4 {
            scheduler.tick();
        }
        assert_eq!(scheduler.rest(), Some((RestKind::BetweenExercises, 0)));

        scheduler.tick();
        assert_eq!(
            scheduler.current_exercise().map(|e| e.name.as_str()),
            Some("E2")
        );
        assert!(scheduler.engine().is_some());
    }

    #[test]
    fn test_pause_freezes_rest_countdown() {
        let group = ProgramItem::group(vec![quick("E1"), quick("E2")], 1, 10);
        let (runtime, _) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);
        scheduler.start_program(program(vec![group], 0)).unwrap();

        for _ in 0..4 {
            scheduler.tick();
        }
        assert_eq!(scheduler.rest(), Some((RestKind::BetweenExercises, 10)));
        scheduler.tick();
        assert_eq!(scheduler.rest(), Some((RestKind::BetweenExercises, 9)));

        assert!(scheduler.pause_program());
        assert!(!scheduler.pause_program());
        for _ in 0..20 {
            assert!(scheduler.tick().is_empty());
        }
        assert_eq!(scheduler.rest(), Some((RestKind::BetweenExercises, 9)));
        assert!(scheduler.snapshot().paused);

        assert!(scheduler.resume_program());
        assert!(!scheduler.resume_program());
        scheduler.tick();
        assert_eq!(scheduler.rest(), Some((RestKind::BetweenExercises, 8)));
    }

    #[test]
    fn test_pause_freezes_exercise() {
        let (runtime, _) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);
        scheduler
            .start_program(program(vec![ProgramItem::standalone(quick("A"), 1)], 0))
            .unwrap();
        scheduler.tick();

        assert!(scheduler.pause_program());
        let before = scheduler.snapshot();
        for _ in 0..10 {
            scheduler.tick();
        }
        assert_eq!(scheduler.snapshot(), before);
        assert!(!scheduler.engine().map(|e| e.is_running()).unwrap_or(true));

        assert!(scheduler.resume_program());
        assert!(scheduler.engine().map(|e| e.is_running()).unwrap_or(false));
    }

    #[test]
    fn test_skip_rest_starts_next_exercise() {
        let group = ProgramItem::group(vec![quick("E1"), quick("E2")], 1, 30);
        let (runtime, _) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);
        scheduler.start_program(program(vec![group], 0)).unwrap();

        assert!(scheduler.skip_rest().is_empty(), "no rest to skip yet");

        for _ in 0..4 {
            scheduler.tick();
        }
        scheduler.pause_program();
        let events = scheduler.skip_rest();

        assert!(events.contains(&ProgramEvent::RestEnded {
            kind: RestKind::BetweenExercises,
            skipped: true
        }));
        assert!(!scheduler.is_paused());
        let engine = scheduler.engine().unwrap();
        assert_eq!(engine.phase(), Phase::Prepare);
        assert!(engine.is_running());
        assert_eq!(scheduler.cursor().exercise_index, 1);
    }

    #[test]
    fn test_advance_exercise_completes_manual_sets() {
        let squat = Exercise::new("Squat", ExerciseSpec::manual(0, 10).with_rounds(2));
        let (runtime, cues) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);
        scheduler
            .start_program(program(vec![ProgramItem::standalone(squat, 1)], 0))
            .unwrap();

        scheduler.tick();
        assert!(scheduler.awaiting_manual_completion());
        for _ in 0..50 {
            scheduler.tick();
        }
        assert!(scheduler.awaiting_manual_completion());

        let events = scheduler.advance_exercise();
        assert!(events
            .iter()
            .any(|e| matches!(e, ProgramEvent::Exercise(EngineEvent::SetCompleted { round: 1, .. }))));

        // rest(0) lasts one tick, then the second set
        scheduler.tick();
        assert!(scheduler.awaiting_manual_completion());
        let events = scheduler.advance_exercise();
        assert!(events
            .iter()
            .any(|e| matches!(e, ProgramEvent::ProgramCompleted { .. })));
        assert!(scheduler.is_finished());
        assert_eq!(cues.played().last(), Some(&Cue::Finish));

        assert!(scheduler.advance_exercise().is_empty());
        assert!(!scheduler.resume_program());
        assert!(scheduler.skip_rest().is_empty());
    }

    #[test]
    fn test_stale_ticket_after_commands() {
        let (runtime, _) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);
        scheduler
            .start_program(program(vec![ProgramItem::standalone(quick("A"), 1)], 0))
            .unwrap();

        let ticket = scheduler.ticket();
        scheduler.pause_program();
        scheduler.resume_program();
        assert!(scheduler.on_tick(ticket).is_empty());
        assert_eq!(scheduler.snapshot().exercise.unwrap().time_remaining, 1);

        let ticket = scheduler.ticket();
        scheduler.advance_exercise();
        assert!(scheduler.on_tick(ticket).is_empty());
        assert_eq!(scheduler.snapshot().exercise.unwrap().time_remaining, 3);

        let ticket = scheduler.ticket();
        scheduler.cancel();
        assert!(scheduler.on_tick(ticket).is_empty());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_snapshot_during_group_rest() {
        let group = ProgramItem::group(vec![quick("E1"), quick("E2")], 2, 10);
        let (runtime, _) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);
        scheduler.start_program(program(vec![group], 0)).unwrap();
        for _ in 0..4 {
            scheduler.tick();
        }

        let snap = scheduler.snapshot();
        assert_eq!(snap.group_size, Some(2));
        assert_eq!(snap.item_rounds, 2);
        assert!(snap.exercise.is_none());
        let rest = snap.rest.unwrap();
        assert_eq!(rest.kind, RestKind::BetweenExercises);
        assert_eq!(rest.up_next.as_deref(), Some("E2"));
    }

    #[test]
    fn test_restart_replaces_running_program() {
        let (runtime, _) = runtime();
        let mut scheduler = ProgramScheduler::new(runtime);
        scheduler
            .start_program(program(vec![ProgramItem::standalone(quick("A"), 1)], 0))
            .unwrap();
        scheduler.tick();
        scheduler.pause_program();

        scheduler
            .start_program(program(vec![ProgramItem::standalone(quick("B"), 1)], 0))
            .unwrap();
        assert!(!scheduler.is_paused());
        assert_eq!(scheduler.current_exercise().unwrap().name, "B");
        assert_eq!(scheduler.engine().unwrap().state().time_remaining, 1);
    }
}
