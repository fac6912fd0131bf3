//! Program construction, editing and loading.
//!
//! Every editing operation leaves the program untouched when an index is out
//! of range or the item has the wrong kind, and reports that through its
//! return value.

use crate::types::{Direction, Exercise, ExerciseGroup, Program, ProgramItem};
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use uuid::Uuid;

impl Program {
    pub fn new(name: impl Into<String>, items: Vec<ProgramItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            items,
            rest_between_items: 0,
        }
    }

    /// Parse a program definition from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a program file. `.json` files are read as JSON, anything else as TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let program = if is_json {
            serde_json::from_str(&contents)?
        } else {
            Self::from_toml_str(&contents)?
        };
        tracing::debug!("Loaded program from {}", path.display());
        Ok(program)
    }

    /// True when at least one item has an exercise to play
    pub fn has_playable_items(&self) -> bool {
        self.items.iter().any(|item| !item.is_empty())
    }

    /// Check the program can be played from start to finish
    pub fn validate(&self) -> Result<()> {
        if !self.has_playable_items() {
            return Err(Error::EmptyProgram);
        }
        for item in &self.items {
            if item.rounds() == 0 {
                return Err(Error::Configuration("item rounds must be at least 1".into()));
            }
            for exercise in item.exercises() {
                exercise.validate()?;
            }
        }
        Ok(())
    }

    pub fn exercise_count(&self) -> usize {
        self.items.iter().map(|item| item.exercises().len()).sum()
    }

    /// Ticks from `start_program` to completion, or `None` when any exercise
    /// has an untimed work phase.
    ///
    /// Rests of zero seconds still take one tick. Empty groups cost nothing;
    /// one item rest separates each pair of consecutive playable items.
    pub fn estimated_ticks(&self) -> Option<u64> {
        let playable: Vec<&ProgramItem> =
            self.items.iter().filter(|item| !item.is_empty()).collect();
        if playable.is_empty() {
            return None;
        }
        let at_least_one = |secs: u32| u64::from(secs.max(1));

        let mut total = 0;
        for item in &playable {
            let rounds = u64::from(item.rounds().max(1));
            let per_round = item
                .exercises()
                .iter()
                .map(|e| e.spec.estimated_ticks())
                .sum::<Option<u64>>()?;
            total += rounds * per_round;

            if let ProgramItem::Group(group) = item {
                let plays = rounds * group.exercises.len() as u64;
                if plays > 0 {
                    total += (plays - 1) * at_least_one(group.rest_between_exercises);
                }
            }
        }

        let transitions = (playable.len() - 1) as u64;
        Some(total + transitions * at_least_one(self.rest_between_items))
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Append a standalone exercise, returning its item index
    pub fn push_exercise(&mut self, exercise: Exercise, rounds: u32) -> usize {
        self.items
            .push(ProgramItem::standalone(exercise, rounds.max(1)));
        self.items.len() - 1
    }

    /// Append an empty group, returning its item index
    pub fn push_group(&mut self, rounds: u32, rest_between_exercises: u32) -> usize {
        self.items.push(ProgramItem::group(
            Vec::new(),
            rounds.max(1),
            rest_between_exercises,
        ));
        self.items.len() - 1
    }

    pub fn remove_item(&mut self, index: usize) -> Option<ProgramItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Swap an item with its neighbour
    pub fn move_item(&mut self, index: usize, direction: Direction) -> bool {
        swap_neighbour(&mut self.items, index, direction)
    }

    pub fn set_item_rounds(&mut self, index: usize, new_rounds: u32) -> bool {
        let new_rounds = new_rounds.max(1);
        match self.items.get_mut(index) {
            Some(ProgramItem::Standalone { rounds, .. }) => *rounds = new_rounds,
            Some(ProgramItem::Group(group)) => group.rounds = new_rounds,
            None => return false,
        }
        true
    }

    pub fn set_group_rest(&mut self, index: usize, rest: u32) -> bool {
        match self.group_mut(index) {
            Some(group) => {
                group.rest_between_exercises = rest;
                true
            }
            None => false,
        }
    }

    /// Replace one exercise in place, keeping its position and rounds
    pub fn replace_exercise(
        &mut self,
        index: usize,
        exercise_index: usize,
        replacement: Exercise,
    ) -> bool {
        let slot = match self.items.get_mut(index) {
            Some(ProgramItem::Standalone { exercise, .. }) if exercise_index == 0 => exercise,
            Some(ProgramItem::Group(group)) => match group.exercises.get_mut(exercise_index) {
                Some(slot) => slot,
                None => return false,
            },
            _ => return false,
        };
        *slot = replacement;
        true
    }

    // ========================================================================
    // Group members
    // ========================================================================

    pub fn add_to_group(&mut self, index: usize, exercise: Exercise) -> bool {
        match self.group_mut(index) {
            Some(group) => {
                group.exercises.push(exercise);
                true
            }
            None => false,
        }
    }

    /// Remove an exercise from a group. The group stays even when emptied.
    pub fn remove_from_group(&mut self, index: usize, exercise_index: usize) -> Option<Exercise> {
        let group = self.group_mut(index)?;
        (exercise_index < group.exercises.len()).then(|| group.exercises.remove(exercise_index))
    }

    pub fn move_within_group(
        &mut self,
        index: usize,
        exercise_index: usize,
        direction: Direction,
    ) -> bool {
        match self.group_mut(index) {
            Some(group) => swap_neighbour(&mut group.exercises, exercise_index, direction),
            None => false,
        }
    }

    /// Move an exercise into the group at `target`.
    ///
    /// With `exercise_index` the exercise comes out of the group at `source`,
    /// which is deleted if that leaves it empty. Without it `source` must be a
    /// standalone item, which is deleted. The exercise is appended to the
    /// target group.
    pub fn move_to_group(
        &mut self,
        source: usize,
        exercise_index: Option<usize>,
        target: usize,
    ) -> bool {
        if source == target || self.group_mut(target).is_none() {
            return false;
        }

        let (exercise, remove_source) = match (self.items.get_mut(source), exercise_index) {
            (Some(ProgramItem::Group(group)), Some(i)) if i < group.exercises.len() => {
                let exercise = group.exercises.remove(i);
                (exercise, group.exercises.is_empty())
            }
            (Some(ProgramItem::Standalone { exercise, .. }), None) => (exercise.clone(), true),
            _ => return false,
        };

        let mut target = target;
        if remove_source {
            self.items.remove(source);
            if target > source {
                target -= 1;
            }
        }
        self.add_to_group(target, exercise)
    }

    /// Pull an exercise out of a group into a standalone item right after it.
    ///
    /// The new item inherits the group's rounds. An emptied group is removed.
    /// Returns the index of the new standalone item.
    pub fn extract_to_standalone(&mut self, index: usize, exercise_index: usize) -> Option<usize> {
        let group = self.group_mut(index)?;
        if exercise_index >= group.exercises.len() {
            return None;
        }
        let exercise = group.exercises.remove(exercise_index);
        let rounds = group.rounds;
        let emptied = group.exercises.is_empty();

        self.items
            .insert(index + 1, ProgramItem::standalone(exercise, rounds));
        if emptied {
            self.items.remove(index);
            Some(index)
        } else {
            Some(index + 1)
        }
    }

    fn group_mut(&mut self, index: usize) -> Option<&mut ExerciseGroup> {
        match self.items.get_mut(index) {
            Some(ProgramItem::Group(group)) => Some(group),
            _ => None,
        }
    }
}

fn swap_neighbour<T>(items: &mut [T], index: usize, direction: Direction) -> bool {
    let other = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => index.checked_add(1),
    };
    match other {
        Some(other) if index < items.len() && other < items.len() => {
            items.swap(index, other);
            true
        }
        _ => false,
    }
}
