use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use derive_more::Deref;
use uuid::Uuid;

use crate::{
    Distance, DistanceUnit, Duration, Exercise, ExerciseSet, Reps, VolumeType, Weight, WeightUnit,
};

pub const MAX_SETS_PER_ROW: u32 = 15;

const DEFAULT_SET_COUNT: usize = 3;
const DEFAULT_REPS: u32 = 10;
const DEFAULT_WEIGHT: f32 = 20.0;
const DEFAULT_DURATION_MIN: f32 = 10.0;
const DEFAULT_DISTANCE: f32 = 1.0;

/// Grouping key shared by the sets of one volume row.
#[derive(Deref, Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VolumeRowID(Uuid);

impl VolumeRowID {
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

impl From<Uuid> for VolumeRowID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for VolumeRowID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

/// Row identity as shown to the collapsed editor. Sets without a row id
/// predate the grouping key and form singleton rows keyed by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RowKey {
    Id(VolumeRowID),
    Legacy(usize),
}

impl Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RowKey::Id(id) => write!(f, "{}", **id),
            RowKey::Legacy(index) => write!(f, "legacy-{index}"),
        }
    }
}

/// Derived view of a group of sets edited as a unit. Rebuilt on demand,
/// never persisted. Shared fields are taken from the group's first set.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeRow {
    pub key: RowKey,
    pub row_type: VolumeType,
    pub total_sets: usize,
    pub reps: Reps,
    pub weight: Option<Weight>,
    pub weight_unit: Option<WeightUnit>,
    pub duration: Option<Duration>,
    pub distance: Option<Distance>,
    pub distance_unit: Option<DistanceUnit>,
    pub set_indices: Vec<usize>,
}

impl VolumeRow {
    /// Row-level duration edits are expressed in minutes.
    #[must_use]
    pub fn duration_min(&self) -> Option<f32> {
        self.duration.map(Duration::as_minutes)
    }
}

/// Requested changes to one volume row. Absent fields are left as they
/// are. All values are sanitized (clamped) before being applied.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RowUpdate {
    pub row_type: Option<VolumeType>,
    pub total_sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f32>,
    pub weight_unit: Option<WeightUnit>,
    pub duration_min: Option<f32>,
    pub distance: Option<f32>,
    pub distance_unit: Option<DistanceUnit>,
}

struct Sanitized {
    row_type: Option<VolumeType>,
    total_sets: Option<usize>,
    reps: Option<Reps>,
    weight: Option<Weight>,
    weight_unit: Option<WeightUnit>,
    duration: Option<Duration>,
    distance: Option<Distance>,
    distance_unit: Option<DistanceUnit>,
}

fn sanitized(update: &RowUpdate) -> Sanitized {
    Sanitized {
        row_type: update.row_type,
        total_sets: update
            .total_sets
            .map(|n| n.clamp(1, MAX_SETS_PER_ROW) as usize),
        reps: update.reps.map(Reps::clamped),
        weight: update.weight.map(Weight::clamped),
        weight_unit: update.weight_unit,
        duration: update.duration_min.map(Duration::from_minutes),
        distance: update.distance.map(Distance::clamped),
        distance_unit: update.distance_unit,
    }
}

fn matches_row(row: &VolumeRow, update: &Sanitized) -> bool {
    update.row_type.is_none_or(|t| t == row.row_type)
        && update.total_sets.is_none_or(|n| n == row.total_sets)
        && update.reps.is_none_or(|r| r == row.reps)
        && update.weight.is_none_or(|w| Some(w) == row.weight)
        && update.weight_unit.is_none_or(|u| Some(u) == row.weight_unit)
        && update.duration.is_none_or(|d| Some(d) == row.duration)
        && update.distance.is_none_or(|d| Some(d) == row.distance)
        && update.distance_unit.is_none_or(|u| Some(u) == row.distance_unit)
}

impl Exercise {
    /// Groups sets strictly by `volume_row_id`, in order of each group's
    /// first set. Value equality plays no role here (that is the
    /// serializer's grouping, not the editor's).
    #[must_use]
    pub fn volume_rows(&self) -> Vec<VolumeRow> {
        let mut rows: Vec<VolumeRow> = vec![];
        let mut row_of: BTreeMap<VolumeRowID, usize> = BTreeMap::new();
        for (i, set) in self.sets.iter().enumerate() {
            match set.volume_row_id {
                Some(id) => {
                    if let Some(&row_index) = row_of.get(&id) {
                        rows[row_index].total_sets += 1;
                        rows[row_index].set_indices.push(i);
                    } else {
                        row_of.insert(id, rows.len());
                        rows.push(row_from_set(RowKey::Id(id), set, i));
                    }
                }
                None => rows.push(row_from_set(RowKey::Legacy(i), set, i)),
            }
        }
        rows
    }

    /// Applies a sanitized row edit and returns the modified exercise.
    /// An invalid row index or an update that changes nothing is a no-op.
    #[must_use]
    pub fn update_volume_row(&self, row_index: usize, update: &RowUpdate) -> Exercise {
        let rows = self.volume_rows();
        let Some(row) = rows.get(row_index) else {
            return self.clone();
        };
        let update = sanitized(update);
        if matches_row(row, &update) {
            return self.clone();
        }
        let new_type = update.row_type.unwrap_or(row.row_type);

        let mut result = self.clone();
        if new_type != row.row_type && new_type.is_single_set() {
            collapse_row(&mut result.sets, row, &update, new_type);
        } else if new_type != row.row_type && row.row_type.is_single_set() {
            expand_row(&mut result.sets, row, &update, new_type);
        } else {
            rewrite_row(&mut result.sets, row, &update, new_type);
            resize_row(&mut result.sets, row, &update);
        }
        result
    }

    #[must_use]
    pub fn add_volume_row(&self) -> Exercise {
        let row_id = VolumeRowID::random();
        let mut result = self.clone();
        result.sets.extend(
            (0..DEFAULT_SET_COUNT)
                .map(|_| ExerciseSet::sets_reps(Reps::clamped(DEFAULT_REPS), row_id)),
        );
        result
    }

    #[must_use]
    pub fn remove_volume_row(&self, row_index: usize) -> Exercise {
        let rows = self.volume_rows();
        let Some(row) = rows.get(row_index) else {
            return self.clone();
        };
        let mut result = self.clone();
        for &i in row.set_indices.iter().rev() {
            result.sets.remove(i);
        }
        result
    }

    /// Idempotent repair pass. Sets with identical displayed values are
    /// forced onto one shared row id, value-unique sets get an id of their
    /// own. Displayed values never change, only `volume_row_id`.
    #[must_use]
    pub fn normalize_volume_rows(&self) -> Exercise {
        let mut groups: Vec<(SetSignature, Vec<usize>)> = vec![];
        for (i, set) in self.sets.iter().enumerate() {
            let signature = set_signature(set);
            if let Some(group) = groups.iter_mut().find(|(s, _)| *s == signature) {
                group.1.push(i);
            } else {
                groups.push((signature, vec![i]));
            }
        }

        let mut result = self.clone();
        let mut used: BTreeSet<VolumeRowID> = BTreeSet::new();
        for (_, indices) in &groups {
            let id = indices
                .iter()
                .filter_map(|&i| self.sets[i].volume_row_id)
                .find(|id| !used.contains(id))
                .unwrap_or_else(VolumeRowID::random);
            used.insert(id);
            for &i in indices {
                result.sets[i].volume_row_id = Some(id);
            }
        }
        result
    }
}

fn row_from_set(key: RowKey, set: &ExerciseSet, index: usize) -> VolumeRow {
    VolumeRow {
        key,
        row_type: set.volume_type,
        total_sets: 1,
        reps: set.reps,
        weight: set.weight,
        weight_unit: set.weight_unit,
        duration: set.duration,
        distance: set.distance,
        distance_unit: set.distance_unit,
        set_indices: vec![index],
    }
}

/// Type change to a single-set type: the whole row collapses to one set
/// and all fields not relevant to the new type are cleared.
fn collapse_row(
    sets: &mut Vec<ExerciseSet>,
    row: &VolumeRow,
    update: &Sanitized,
    new_type: VolumeType,
) {
    let row_id = VolumeRowID::random();
    let new_set = match new_type {
        VolumeType::Duration => ExerciseSet::duration(
            update
                .duration
                .unwrap_or_else(|| Duration::from_minutes(DEFAULT_DURATION_MIN)),
            row_id,
        ),
        VolumeType::Distance => ExerciseSet::distance(
            update
                .distance
                .unwrap_or_else(|| Distance::clamped(DEFAULT_DISTANCE)),
            update.distance_unit.unwrap_or(DistanceUnit::Km),
            row_id,
        ),
        _ => ExerciseSet::completion(row_id),
    };
    let first = row.set_indices[0];
    for &i in row.set_indices.iter().rev() {
        sets.remove(i);
    }
    sets.insert(first, new_set);
}

/// Type change from a single-set type to sets-reps[-weight]: the row
/// expands to a default of three sets sharing one fresh row id.
fn expand_row(
    sets: &mut Vec<ExerciseSet>,
    row: &VolumeRow,
    update: &Sanitized,
    new_type: VolumeType,
) {
    let row_id = VolumeRowID::random();
    let reps = update.reps.unwrap_or_else(|| Reps::clamped(DEFAULT_REPS));
    let template = if new_type == VolumeType::SetsRepsWeight {
        ExerciseSet::weighted(
            reps,
            update.weight.unwrap_or_else(|| Weight::clamped(DEFAULT_WEIGHT)),
            update.weight_unit.unwrap_or(WeightUnit::Kg),
            row_id,
        )
    } else {
        ExerciseSet::sets_reps(reps, row_id)
    };
    let count = update.total_sets.unwrap_or(DEFAULT_SET_COUNT);
    let first = row.set_indices[0];
    for &i in row.set_indices.iter().rev() {
        sets.remove(i);
    }
    for _ in 0..count {
        sets.insert(first, template.clone());
    }
}

/// Rewrites every set of the row with the new shared values and forces
/// them onto one common row id, healing any prior fragmentation.
fn rewrite_row(sets: &mut [ExerciseSet], row: &VolumeRow, update: &Sanitized, new_type: VolumeType) {
    let shared_id = row
        .set_indices
        .iter()
        .find_map(|&i| sets[i].volume_row_id)
        .unwrap_or_else(VolumeRowID::random);
    for &i in &row.set_indices {
        let set = &mut sets[i];
        set.volume_type = new_type;
        set.volume_row_id = Some(shared_id);
        if let Some(reps) = update.reps {
            set.reps = reps;
        }
        match new_type {
            VolumeType::SetsRepsWeight => {
                if let Some(weight) = update.weight {
                    set.weight = Some(weight);
                }
                if set.weight.is_none() {
                    set.weight = Some(Weight::clamped(DEFAULT_WEIGHT));
                }
                if let Some(unit) = update.weight_unit {
                    set.weight_unit = Some(unit);
                }
                if set.weight_unit.is_none() {
                    set.weight_unit = Some(WeightUnit::Kg);
                }
                set.duration = None;
                set.distance = None;
                set.distance_unit = None;
            }
            VolumeType::Duration => {
                if let Some(duration) = update.duration {
                    set.duration = Some(duration);
                }
                set.weight = None;
                set.weight_unit = None;
                set.distance = None;
                set.distance_unit = None;
            }
            VolumeType::Distance => {
                if let Some(distance) = update.distance {
                    set.distance = Some(distance);
                }
                if let Some(unit) = update.distance_unit {
                    set.distance_unit = Some(unit);
                }
                set.weight = None;
                set.weight_unit = None;
                set.duration = None;
            }
            VolumeType::SetsReps | VolumeType::Completion => {
                set.weight = None;
                set.weight_unit = None;
                set.duration = None;
                set.distance = None;
                set.distance_unit = None;
            }
        }
    }
}

/// Count change: grows by cloning the row's first set as template or
/// truncates from the tail of the row's index range.
fn resize_row(sets: &mut Vec<ExerciseSet>, row: &VolumeRow, update: &Sanitized) {
    let Some(target) = update.total_sets else {
        return;
    };
    let current = row.set_indices.len();
    let first = row.set_indices[0];
    if target == current || sets[first].volume_type.is_single_set() {
        return;
    }
    if target > current {
        let template = sets[first].clone();
        let insert_at = row.set_indices[current - 1] + 1;
        for _ in current..target {
            sets.insert(insert_at, template.clone());
        }
    } else {
        for &i in row.set_indices.iter().rev().take(current - target) {
            sets.remove(i);
        }
    }
}

pub(crate) type SetSignature = (
    VolumeType,
    u32,
    Option<u32>,
    Option<WeightUnit>,
    Option<u32>,
    Option<u32>,
    Option<DistanceUnit>,
);

/// Displayed values of a set, with floats compared bit-exactly. The row
/// id is deliberately not part of the signature.
pub(crate) fn set_signature(set: &ExerciseSet) -> SetSignature {
    (
        set.volume_type,
        u32::from(set.reps),
        set.weight.map(|w| f32::from(w).to_bits()),
        set.weight_unit,
        set.duration.map(u32::from),
        set.distance.map(|d| f32::from(d).to_bits()),
        set.distance_unit,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::Name;

    use super::*;

    fn weighted_exercise() -> Exercise {
        let row_id = VolumeRowID::from(10);
        Exercise::new(
            1.into(),
            Name::new("Bench Press").unwrap(),
            (0..3)
                .map(|_| {
                    ExerciseSet::weighted(
                        Reps::clamped(10),
                        Weight::clamped(50.0),
                        WeightUnit::Kg,
                        row_id,
                    )
                })
                .collect(),
        )
    }

    fn mixed_exercise() -> Exercise {
        let mut exercise = weighted_exercise();
        exercise
            .sets
            .push(ExerciseSet::duration(Duration::clamped(600), 11.into()));
        let mut legacy = ExerciseSet::sets_reps(Reps::clamped(5), 12.into());
        legacy.volume_row_id = None;
        exercise.sets.push(legacy.clone());
        exercise.sets.push(legacy);
        exercise
    }

    #[test]
    fn test_volume_rows_groups_by_id() {
        let rows = mixed_exercise().volume_rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].key, RowKey::Id(10.into()));
        assert_eq!(rows[0].total_sets, 3);
        assert_eq!(rows[0].set_indices, vec![0, 1, 2]);
        assert_eq!(rows[1].key, RowKey::Id(11.into()));
        assert_eq!(rows[1].row_type, VolumeType::Duration);
        // Id-less sets are singleton rows even when their values match.
        assert_eq!(rows[2].key, RowKey::Legacy(4));
        assert_eq!(rows[3].key, RowKey::Legacy(5));
    }

    #[test]
    fn test_volume_rows_idempotent() {
        let exercise = mixed_exercise();
        assert_eq!(exercise.volume_rows(), exercise.volume_rows());
    }

    #[test]
    fn test_volume_rows_interleaved_groups_ordered_by_first_index() {
        let mut exercise = weighted_exercise();
        exercise.sets[1].volume_row_id = Some(20.into());
        let rows = exercise.volume_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].set_indices, vec![0, 2]);
        assert_eq!(rows[1].set_indices, vec![1]);
    }

    #[test]
    fn test_row_key_display() {
        assert_eq!(RowKey::Legacy(3).to_string(), "legacy-3");
    }

    #[test]
    fn test_update_invalid_index_is_noop() {
        let exercise = weighted_exercise();
        let updated = exercise.update_volume_row(
            5,
            &RowUpdate {
                reps: Some(12),
                ..RowUpdate::default()
            },
        );
        assert_eq!(updated, exercise);
    }

    #[test]
    fn test_update_without_change_is_noop() {
        let exercise = weighted_exercise();
        let updated = exercise.update_volume_row(
            0,
            &RowUpdate {
                reps: Some(10),
                weight: Some(50.0),
                ..RowUpdate::default()
            },
        );
        assert_eq!(updated, exercise);
    }

    #[test]
    fn test_type_change_to_duration_collapses_to_single_set() {
        let updated = weighted_exercise().update_volume_row(
            0,
            &RowUpdate {
                row_type: Some(VolumeType::Duration),
                duration_min: Some(5.0),
                ..RowUpdate::default()
            },
        );
        assert_eq!(updated.sets.len(), 1);
        let set = &updated.sets[0];
        assert_eq!(set.volume_type, VolumeType::Duration);
        assert_eq!(set.reps, Reps::clamped(1));
        assert_eq!(set.duration, Some(Duration::clamped(300)));
        assert_eq!(set.weight, None);
        assert_eq!(set.weight_unit, None);
    }

    #[test]
    fn test_type_change_to_multi_set_expands_to_three_sets() {
        let mut exercise = weighted_exercise();
        exercise = exercise.update_volume_row(
            0,
            &RowUpdate {
                row_type: Some(VolumeType::Distance),
                ..RowUpdate::default()
            },
        );
        let updated = exercise.update_volume_row(
            0,
            &RowUpdate {
                row_type: Some(VolumeType::SetsReps),
                ..RowUpdate::default()
            },
        );
        assert_eq!(updated.sets.len(), 3);
        let row_id = updated.sets[0].volume_row_id;
        assert!(row_id.is_some());
        for set in &updated.sets {
            assert_eq!(set.volume_type, VolumeType::SetsReps);
            assert_eq!(set.reps, Reps::clamped(10));
            assert_eq!(set.volume_row_id, row_id);
            assert_eq!(set.distance, None);
        }
    }

    #[test]
    fn test_count_growth_clones_first_set() {
        let updated = weighted_exercise().update_volume_row(
            0,
            &RowUpdate {
                total_sets: Some(5),
                ..RowUpdate::default()
            },
        );
        assert_eq!(updated.sets.len(), 5);
        for set in &updated.sets {
            assert_eq!(set.weight, Some(Weight::clamped(50.0)));
        }
    }

    #[test]
    fn test_count_change_is_reversible() {
        let exercise = mixed_exercise();
        let grown = exercise.update_volume_row(
            0,
            &RowUpdate {
                total_sets: Some(5),
                ..RowUpdate::default()
            },
        );
        assert_eq!(grown.volume_rows()[0].total_sets, 5);
        let shrunk = grown.update_volume_row(
            0,
            &RowUpdate {
                total_sets: Some(3),
                ..RowUpdate::default()
            },
        );
        assert_eq!(shrunk, exercise);
    }

    #[test]
    fn test_field_change_heals_fragmented_ids() {
        let mut exercise = weighted_exercise();
        exercise.sets[2].volume_row_id = None;
        // One row per id fragment before the edit.
        assert_eq!(exercise.volume_rows().len(), 2);
        let updated = exercise.update_volume_row(
            0,
            &RowUpdate {
                reps: Some(8),
                ..RowUpdate::default()
            },
        );
        assert_eq!(updated.sets[0].reps, Reps::clamped(8));
        assert_eq!(updated.sets[1].reps, Reps::clamped(8));
        // The edited row keeps its id; the fragment stays a separate row.
        assert_eq!(updated.sets[0].volume_row_id, Some(10.into()));
        assert_eq!(updated.sets[1].volume_row_id, Some(10.into()));
        assert_eq!(updated.sets[2].volume_row_id, None);
    }

    #[test]
    fn test_retype_between_multi_set_types_keeps_count() {
        let updated = weighted_exercise().update_volume_row(
            0,
            &RowUpdate {
                row_type: Some(VolumeType::SetsReps),
                ..RowUpdate::default()
            },
        );
        assert_eq!(updated.sets.len(), 3);
        for set in &updated.sets {
            assert_eq!(set.volume_type, VolumeType::SetsReps);
            assert_eq!(set.weight, None);
            assert_eq!(set.weight_unit, None);
        }
    }

    #[rstest]
    #[case(RowUpdate { reps: Some(5000), ..RowUpdate::default() }, Reps::clamped(999))]
    #[case(RowUpdate { reps: Some(0), ..RowUpdate::default() }, Reps::clamped(1))]
    fn test_reps_sanitization(#[case] update: RowUpdate, #[case] expected: Reps) {
        let updated = weighted_exercise().update_volume_row(0, &update);
        assert_eq!(updated.sets[0].reps, expected);
    }

    #[rstest]
    #[case(-5.0, Weight::clamped(0.0))]
    #[case(f32::NAN, Weight::clamped(0.0))]
    #[case(20_000.0, Weight::clamped(9999.0))]
    fn test_weight_sanitization(#[case] weight: f32, #[case] expected: Weight) {
        let updated = weighted_exercise().update_volume_row(
            0,
            &RowUpdate {
                weight: Some(weight),
                ..RowUpdate::default()
            },
        );
        assert_eq!(updated.sets[0].weight, Some(expected));
    }

    #[test]
    fn test_total_sets_sanitization() {
        let updated = weighted_exercise().update_volume_row(
            0,
            &RowUpdate {
                total_sets: Some(99),
                ..RowUpdate::default()
            },
        );
        assert_eq!(updated.sets.len(), 15);
    }

    #[test]
    fn test_add_volume_row() {
        let exercise = weighted_exercise();
        let updated = exercise.add_volume_row();
        assert_eq!(updated.sets.len(), 6);
        let rows = updated.volume_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_type, VolumeType::SetsReps);
        assert_eq!(rows[1].reps, Reps::clamped(10));
        assert_eq!(rows[1].total_sets, 3);
    }

    #[test]
    fn test_remove_volume_row() {
        let exercise = mixed_exercise();
        let updated = exercise.remove_volume_row(0);
        assert_eq!(updated.sets.len(), 3);
        assert_eq!(updated.volume_rows()[0].row_type, VolumeType::Duration);
        assert_eq!(exercise.remove_volume_row(9), exercise);
    }

    #[test]
    fn test_normalize_merges_identical_sets_and_keeps_values() {
        let exercise = mixed_exercise();
        let normalized = exercise.normalize_volume_rows();
        for (a, b) in exercise.sets.iter().zip(&normalized.sets) {
            assert_eq!(set_signature(a), set_signature(b));
        }
        // The two id-less value-identical sets now share one row.
        let rows = normalized.volume_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].total_sets, 2);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalized = mixed_exercise().normalize_volume_rows();
        assert_eq!(normalized.normalize_volume_rows(), normalized);
    }

    #[test]
    fn test_normalize_splits_value_unique_sets_sharing_an_id() {
        let mut exercise = weighted_exercise();
        exercise.sets[2].reps = Reps::clamped(8);
        let normalized = exercise.normalize_volume_rows();
        let rows = normalized.volume_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_sets, 2);
        assert_eq!(rows[1].total_sets, 1);
        assert_ne!(
            normalized.sets[0].volume_row_id,
            normalized.sets[2].volume_row_id
        );
    }
}
