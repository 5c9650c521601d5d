use derive_more::Deref;
use uuid::Uuid;

use crate::{
    Distance, DistanceUnit, Duration, Name, Reps, VolumeRowID, VolumeType, Weight, WeightUnit,
};

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(Uuid);

impl ExerciseID {
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

impl From<Uuid> for ExerciseID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for ExerciseID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

/// One exercise of a workout, owning its sets exclusively. Set order is
/// significant, completion tracking is positional.
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: Name,
    pub category: String,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
    pub instructions: String,
    pub notes: String,
    pub sets: Vec<ExerciseSet>,
}

impl Exercise {
    #[must_use]
    pub fn new(id: ExerciseID, name: Name, sets: Vec<ExerciseSet>) -> Self {
        Self {
            id,
            name,
            category: String::new(),
            muscle_groups: vec![],
            equipment: vec![],
            instructions: String::new(),
            notes: String::new(),
            sets,
        }
    }
}

/// One performable unit. Which of the optional fields are relevant is
/// determined by `volume_type`. Completion is not stored here but in the
/// positional progress list of [`crate::WorkoutExecutionState`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSet {
    pub volume_type: VolumeType,
    pub reps: Reps,
    pub weight: Option<Weight>,
    pub weight_unit: Option<WeightUnit>,
    pub duration: Option<Duration>,
    pub distance: Option<Distance>,
    pub distance_unit: Option<DistanceUnit>,
    pub volume_row_id: Option<VolumeRowID>,
    pub rest_time: Option<Duration>,
    pub notes: String,
}

impl ExerciseSet {
    #[must_use]
    pub fn sets_reps(reps: Reps, volume_row_id: VolumeRowID) -> Self {
        Self {
            volume_type: VolumeType::SetsReps,
            reps,
            weight: None,
            weight_unit: None,
            duration: None,
            distance: None,
            distance_unit: None,
            volume_row_id: Some(volume_row_id),
            rest_time: None,
            notes: String::new(),
        }
    }

    #[must_use]
    pub fn weighted(
        reps: Reps,
        weight: Weight,
        weight_unit: WeightUnit,
        volume_row_id: VolumeRowID,
    ) -> Self {
        Self {
            volume_type: VolumeType::SetsRepsWeight,
            weight: Some(weight),
            weight_unit: Some(weight_unit),
            ..Self::sets_reps(reps, volume_row_id)
        }
    }

    #[must_use]
    pub fn duration(duration: Duration, volume_row_id: VolumeRowID) -> Self {
        Self {
            volume_type: VolumeType::Duration,
            duration: Some(duration),
            ..Self::sets_reps(Reps::clamped(1), volume_row_id)
        }
    }

    #[must_use]
    pub fn distance(
        distance: Distance,
        distance_unit: DistanceUnit,
        volume_row_id: VolumeRowID,
    ) -> Self {
        Self {
            volume_type: VolumeType::Distance,
            distance: Some(distance),
            distance_unit: Some(distance_unit),
            ..Self::sets_reps(Reps::clamped(1), volume_row_id)
        }
    }

    #[must_use]
    pub fn completion(volume_row_id: VolumeRowID) -> Self {
        Self {
            volume_type: VolumeType::Completion,
            ..Self::sets_reps(Reps::clamped(1), volume_row_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_exercise_id_nil() {
        assert!(ExerciseID::nil().is_nil());
        assert_eq!(ExerciseID::nil(), ExerciseID::default());
    }

    #[test]
    fn test_exercise_id_random() {
        assert!(!ExerciseID::random().is_nil());
        assert_ne!(ExerciseID::random(), ExerciseID::random());
    }

    #[test]
    fn test_set_constructors() {
        let row_id = VolumeRowID::random();
        let set = ExerciseSet::weighted(
            Reps::clamped(10),
            Weight::clamped(50.0),
            WeightUnit::Kg,
            row_id,
        );
        assert_eq!(set.volume_type, VolumeType::SetsRepsWeight);
        assert_eq!(set.volume_row_id, Some(row_id));
        assert_eq!(set.duration, None);

        let set = ExerciseSet::duration(Duration::clamped(600), row_id);
        assert_eq!(set.volume_type, VolumeType::Duration);
        assert_eq!(set.reps, Reps::clamped(1));
        assert_eq!(set.weight, None);
    }
}
