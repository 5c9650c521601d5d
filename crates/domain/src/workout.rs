use std::collections::BTreeMap;

use derive_more::Deref;
use uuid::Uuid;

use crate::{Exercise, ExerciseID, Name};

/// Per-set completion flags, parallel to each exercise's set list.
pub type Progress = BTreeMap<ExerciseID, Vec<bool>>;

#[derive(Deref, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkoutID(Uuid);

impl WorkoutID {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for WorkoutID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for WorkoutID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: WorkoutID,
    pub name: Name,
    pub exercises: Vec<Exercise>,
}

/// A workout together with its per-set completion state. The progress list
/// of an exercise must stay parallel to its set list; every structural
/// mutation goes through [`WorkoutExecutionState::reconcile_progress`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutExecutionState {
    pub workout: Workout,
    pub progress: Progress,
}

impl WorkoutExecutionState {
    #[must_use]
    pub fn new(workout: Workout) -> Self {
        let mut state = Self {
            workout,
            progress: Progress::new(),
        };
        state.reconcile_progress();
        state
    }

    /// Restores the `progress[id].len() == exercise.sets.len()` invariant
    /// by truncating or padding with `false`. Values at unchanged indices
    /// are preserved; entries of removed exercises are dropped.
    pub fn reconcile_progress(&mut self) {
        let known = self
            .workout
            .exercises
            .iter()
            .map(|e| e.id)
            .collect::<std::collections::BTreeSet<_>>();
        self.progress.retain(|id, _| known.contains(id));
        for exercise in &self.workout.exercises {
            self.progress
                .entry(exercise.id)
                .or_default()
                .resize(exercise.sets.len(), false);
        }
    }

    pub fn set_completed(&mut self, exercise_id: ExerciseID, set_index: usize, completed: bool) {
        if let Some(flags) = self.progress.get_mut(&exercise_id) {
            if let Some(flag) = flags.get_mut(set_index) {
                *flag = completed;
            }
        }
    }

    #[must_use]
    pub fn completed_sets(&self, exercise_id: ExerciseID) -> usize {
        self.progress
            .get(&exercise_id)
            .map(|flags| flags.iter().filter(|c| **c).count())
            .unwrap_or_default()
    }
}
