//! Core domain types for the HIIT timer.
//!
//! This module defines the value objects handed to the playback core by the
//! authoring side:
//! - Exercise configuration (timed or manual-rep)
//! - Program items (standalone exercises and repeatable groups)
//! - Programs

use crate::config::ExerciseDefaults;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::slice;
use uuid::Uuid;

// ============================================================================
// Exercise Types
// ============================================================================

/// How the work phase of an exercise ends
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseMode {
    /// Work phase counts down from `work_time`
    #[default]
    Timed,
    /// Work phase lasts until the user marks the set complete
    Manual,
}

/// Immutable configuration for one exercise. All times are in seconds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSpec {
    #[serde(default)]
    pub mode: ExerciseMode,
    #[serde(default)]
    pub prepare_time: u32,
    /// Required for timed exercises, ignored for manual ones
    #[serde(default)]
    pub work_time: Option<u32>,
    #[serde(default)]
    pub rest_time: u32,
    #[serde(default = "default_one")]
    pub rounds: u32,
    #[serde(default = "default_one")]
    pub cycles: u32,
    #[serde(default)]
    pub rest_between_cycles: u32,
    /// Target repetitions per set (manual mode)
    #[serde(default)]
    pub repetitions: Option<u32>,
    /// Load in kg (manual mode, informational)
    #[serde(default)]
    pub load: Option<f64>,
}

fn default_one() -> u32 {
    1
}

impl ExerciseSpec {
    /// A timed exercise with no rest and a single round and cycle
    pub fn timed(prepare_time: u32, work_time: u32) -> Self {
        Self {
            mode: ExerciseMode::Timed,
            prepare_time,
            work_time: Some(work_time),
            rest_time: 0,
            rounds: 1,
            cycles: 1,
            rest_between_cycles: 0,
            repetitions: None,
            load: None,
        }
    }

    /// A manual-rep exercise with no rest and a single round and cycle
    pub fn manual(prepare_time: u32, repetitions: u32) -> Self {
        Self {
            mode: ExerciseMode::Manual,
            prepare_time,
            work_time: None,
            rest_time: 0,
            rounds: 1,
            cycles: 1,
            rest_between_cycles: 0,
            repetitions: Some(repetitions),
            load: None,
        }
    }

    pub fn with_rest(mut self, rest_time: u32) -> Self {
        self.rest_time = rest_time;
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_cycles(mut self, cycles: u32, rest_between_cycles: u32) -> Self {
        self.cycles = cycles;
        self.rest_between_cycles = rest_between_cycles;
        self
    }

    pub fn with_load(mut self, load: f64) -> Self {
        self.load = Some(load);
        self
    }

    /// Copy of this configuration restricted to a single cycle
    pub fn single_cycle(&self) -> Self {
        Self {
            cycles: 1,
            ..self.clone()
        }
    }

    pub fn is_manual(&self) -> bool {
        self.mode == ExerciseMode::Manual
    }

    /// Length of the work phase, `None` when the work phase is untimed
    pub fn timed_work(&self) -> Option<u32> {
        match self.mode {
            ExerciseMode::Timed => self.work_time,
            ExerciseMode::Manual => None,
        }
    }

    /// Check that every field required by the mode is present and in range
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(Error::Configuration("rounds must be at least 1".into()));
        }
        if self.cycles == 0 {
            return Err(Error::Configuration("cycles must be at least 1".into()));
        }

        match self.mode {
            ExerciseMode::Timed => match self.work_time {
                None => Err(Error::Configuration(
                    "timed exercise requires work_time".into(),
                )),
                Some(0) => Err(Error::Configuration(
                    "work_time must be greater than zero".into(),
                )),
                Some(_) => Ok(()),
            },
            ExerciseMode::Manual => {
                match self.repetitions {
                    None => {
                        return Err(Error::Configuration(
                            "manual exercise requires repetitions".into(),
                        ))
                    }
                    Some(0) => {
                        return Err(Error::Configuration(
                            "repetitions must be at least 1".into(),
                        ))
                    }
                    Some(_) => {}
                }
                match self.load {
                    Some(load) if !load.is_finite() || load < 0.0 => Err(Error::Configuration(
                        format!("load must be a non-negative number, got {}", load),
                    )),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Number of one-second ticks from `start()` until the exercise finishes
    ///
    /// Every phase lasts at least one tick, so with `X' = max(X, 1)`:
    ///
    /// `P' + cycles * (rounds * W' + (rounds - 1) * R') + (cycles - 1) * C'`
    ///
    /// Returns `None` for manual exercises, whose work phases are untimed.
    pub fn estimated_ticks(&self) -> Option<u64> {
        let work = self.timed_work()?;
        let at_least_one = |secs: u32| u64::from(secs.max(1));

        let rounds = u64::from(self.rounds.max(1));
        let cycles = u64::from(self.cycles.max(1));

        let per_cycle = rounds * at_least_one(work) + (rounds - 1) * at_least_one(self.rest_time);
        Some(
            at_least_one(self.prepare_time)
                + cycles * per_cycle
                + (cycles - 1) * at_least_one(self.rest_between_cycles),
        )
    }

    /// One-line description, e.g. "45s work • 15s rest • 4 cycles"
    pub fn summary(&self) -> String {
        let mut details = Vec::new();

        match self.mode {
            ExerciseMode::Timed => {
                if let Some(work) = self.work_time {
                    details.push(format!("{}s work", work));
                }
            }
            ExerciseMode::Manual => {
                if let Some(reps) = self.repetitions {
                    details.push(format!("{} reps", reps));
                }
                if let Some(load) = self.load.filter(|l| *l > 0.0) {
                    details.push(format!("{}kg", load));
                }
            }
        }

        if self.rest_time > 0 {
            details.push(format!("{}s rest", self.rest_time));
        }
        if self.cycles > 1 {
            details.push(format!("{} cycles", self.cycles));
        }

        details.join(" • ")
    }
}

/// A named exercise as it appears in a program
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub spec: ExerciseSpec,
}

impl Exercise {
    pub fn new(name: impl Into<String>, spec: ExerciseSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            spec,
        }
    }

    /// Create a timed exercise pre-filled with the configured defaults
    pub fn from_defaults(name: impl Into<String>, defaults: &ExerciseDefaults) -> Self {
        Self::new(
            name,
            ExerciseSpec {
                mode: ExerciseMode::Timed,
                prepare_time: defaults.prepare_time,
                work_time: Some(defaults.work_time),
                rest_time: defaults.rest_time,
                rounds: defaults.rounds,
                cycles: defaults.cycles,
                rest_between_cycles: defaults.rest_between_cycles,
                repetitions: Some(defaults.repetitions),
                load: Some(defaults.load),
            },
        )
    }

    /// Validate the spec, naming the exercise in the error
    pub fn validate(&self) -> Result<()> {
        self.spec.validate().map_err(|e| match e {
            Error::Configuration(msg) => {
                Error::Configuration(format!("exercise '{}': {}", self.name, msg))
            }
            other => other,
        })
    }
}

// ============================================================================
// Program Types
// ============================================================================

/// Exercises played back-to-back and repeated as a unit
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseGroup {
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default = "default_one")]
    pub rounds: u32,
    #[serde(default)]
    pub rest_between_exercises: u32,
}

/// One entry in a program
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgramItem {
    Standalone {
        exercise: Exercise,
        #[serde(default = "default_one")]
        rounds: u32,
    },
    Group(ExerciseGroup),
}

impl ProgramItem {
    pub fn standalone(exercise: Exercise, rounds: u32) -> Self {
        ProgramItem::Standalone { exercise, rounds }
    }

    pub fn group(exercises: Vec<Exercise>, rounds: u32, rest_between_exercises: u32) -> Self {
        ProgramItem::Group(ExerciseGroup {
            exercises,
            rounds,
            rest_between_exercises,
        })
    }

    /// How many times the item as a whole is played
    pub fn rounds(&self) -> u32 {
        match self {
            ProgramItem::Standalone { rounds, .. } => *rounds,
            ProgramItem::Group(group) => group.rounds,
        }
    }

    /// The exercises of this item in playback order
    pub fn exercises(&self) -> &[Exercise] {
        match self {
            ProgramItem::Standalone { exercise, .. } => slice::from_ref(exercise),
            ProgramItem::Group(group) => &group.exercises,
        }
    }

    pub fn exercise_at(&self, index: usize) -> Option<&Exercise> {
        self.exercises().get(index)
    }

    /// True for groups without exercises; such items have nothing to play
    pub fn is_empty(&self) -> bool {
        self.exercises().is_empty()
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ProgramItem::Group(_))
    }
}

/// An ordered sequence of items played as one session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Program {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ProgramItem>,
    #[serde(default)]
    pub rest_between_items: u32,
}

/// Direction for reordering items and group members
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_requires_work_time() {
        let mut spec = ExerciseSpec::timed(5, 30);
        spec.work_time = None;

        let err = spec.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("work_time"));
    }

    #[test]
    fn test_manual_requires_repetitions() {
        let mut spec = ExerciseSpec::manual(5, 10);
        spec.repetitions = None;

        let err = spec.validate().unwrap_err();
        assert!(err.to_string().contains("repetitions"));
    }

    #[test]
    fn test_manual_ignores_work_time() {
        let mut spec = ExerciseSpec::manual(0, 8);
        spec.work_time = Some(40);

        assert!(spec.validate().is_ok());
        assert_eq!(spec.timed_work(), None);
        assert_eq!(spec.estimated_ticks(), None);
    }

    #[test]
    fn test_rejects_zero_rounds_and_negative_load() {
        assert!(ExerciseSpec::timed(0, 10).with_rounds(0).validate().is_err());
        assert!(ExerciseSpec::manual(0, 5).with_load(-2.5).validate().is_err());
        assert!(ExerciseSpec::manual(0, 5).with_load(0.0).validate().is_ok());
    }

    #[test]
    fn test_exercise_error_names_exercise() {
        let mut exercise = Exercise::new("Plank", ExerciseSpec::timed(5, 30));
        exercise.spec.work_time = None;

        let msg = exercise.validate().unwrap_err().to_string();
        assert!(msg.contains("Plank"));
    }

    #[test]
    fn test_estimated_ticks_closed_form() {
        // 5 + (10 + 5 + 10) = 30
        let a = ExerciseSpec::timed(5, 10).with_rest(5).with_rounds(2);
        assert_eq!(a.estimated_ticks(), Some(30));

        // 3 + 2 * (3 * 20 + 2 * 10) + 1 * 60 = 223
        let b = ExerciseSpec::timed(3, 20)
            .with_rest(10)
            .with_rounds(3)
            .with_cycles(2, 60);
        assert_eq!(b.estimated_ticks(), Some(223));

        // zero-length phases still take one tick: 1 + 2 * (2 * 4 + 1 * 1) + 1 * 1 = 20
        let c = ExerciseSpec::timed(0, 4)
            .with_rest(0)
            .with_rounds(2)
            .with_cycles(2, 0);
        assert_eq!(c.estimated_ticks(), Some(20));
    }

    #[test]
    fn test_summary() {
        let timed = ExerciseSpec::timed(5, 45).with_rest(15).with_cycles(4, 60);
        assert_eq!(timed.summary(), "45s work • 15s rest • 4 cycles");

        let manual = ExerciseSpec::manual(5, 12).with_load(32.5);
        assert_eq!(manual.summary(), "12 reps • 32.5kg");
    }

    #[test]
    fn test_single_cycle() {
        let spec = ExerciseSpec::timed(5, 45).with_cycles(4, 60);
        let single = spec.single_cycle();
        assert_eq!(single.cycles, 1);
        assert_eq!(single.work_time, Some(45));
    }

    #[test]
    fn test_item_exercises() {
        let a = Exercise::new("A", ExerciseSpec::timed(0, 5));
        let b = Exercise::new("B", ExerciseSpec::timed(0, 5));

        let standalone = ProgramItem::standalone(a.clone(), 2);
        assert_eq!(standalone.exercises().len(), 1);
        assert_eq!(standalone.rounds(), 2);

        let group = ProgramItem::group(vec![a, b], 3, 10);
        assert_eq!(group.exercise_at(1).map(|e| e.name.as_str()), Some("B"));
        assert!(ProgramItem::group(vec![], 1, 0).is_empty());
    }

    #[test]
    fn test_item_toml_tagging() {
        let toml_str = r#"
type = "group"
rounds = 2
rest_between_exercises = 10

[[exercises]]
name = "Squat"
mode = "manual"
repetitions = 12
load = 40.0
"#;
        let item: ProgramItem = toml::from_str(toml_str).unwrap();
        match item {
            ProgramItem::Group(group) => {
                assert_eq!(group.rounds, 2);
                assert_eq!(group.exercises[0].spec.mode, ExerciseMode::Manual);
                assert_eq!(group.exercises[0].spec.rounds, 1);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }
}
