use std::collections::BTreeMap;

use traintext_domain::ExerciseID;

/// Editable fields of a volume row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RowField {
    TotalSets,
    Reps,
    Weight,
    Duration,
    Distance,
}

/// Uncommitted field edits, keyed by exercise, row index and field. An
/// uncommitted value overrides the derived display value until it is
/// committed on blur or discarded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingEdits {
    entries: BTreeMap<(ExerciseID, usize, RowField), String>,
}

impl PendingEdits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, exercise_id: ExerciseID, row_index: usize, field: RowField, value: &str) {
        self.entries
            .insert((exercise_id, row_index, field), value.to_string());
    }

    #[must_use]
    pub fn get(&self, exercise_id: ExerciseID, row_index: usize, field: RowField) -> Option<&str> {
        self.entries
            .get(&(exercise_id, row_index, field))
            .map(String::as_str)
    }

    /// The value to display: the uncommitted edit if present, otherwise
    /// the derived value.
    #[must_use]
    pub fn display<'a>(
        &'a self,
        exercise_id: ExerciseID,
        row_index: usize,
        field: RowField,
        derived: &'a str,
    ) -> &'a str {
        self.get(exercise_id, row_index, field).unwrap_or(derived)
    }

    /// Removes and returns the edit, to be applied to the structured
    /// state by the caller.
    pub fn commit(
        &mut self,
        exercise_id: ExerciseID,
        row_index: usize,
        field: RowField,
    ) -> Option<String> {
        self.entries.remove(&(exercise_id, row_index, field))
    }

    pub fn discard(&mut self, exercise_id: ExerciseID, row_index: usize, field: RowField) {
        self.entries.remove(&(exercise_id, row_index, field));
    }

    /// Drops all edits of one exercise, e.g. when its rows are rebuilt.
    pub fn discard_exercise(&mut self, exercise_id: ExerciseID) {
        self.entries.retain(|(id, _, _), _| *id != exercise_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
