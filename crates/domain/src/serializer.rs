use crate::{
    DistanceUnit, Exercise, ExerciseSet, Progress, VolumeType, WeightUnit, Workout,
    volume_row::set_signature,
};

/// Serializes structured state plus per-set completion back into canonical
/// notation text. Rows are formed by grouping *consecutive* sets with
/// identical displayed values, independent of `volume_row_id` (the row id
/// grouping is the editor's concern, not the serializer's). Completion
/// survives only as a count of `+` markers per row, not as positions; sets
/// of the completion-only type and cue notes are not representable and are
/// omitted.
#[must_use]
pub fn generate_workout_text(workout: &Workout, progress: &Progress) -> String {
    let mut text = String::new();
    for (i, exercise) in workout.exercises.iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        text.push_str(exercise.name.as_str());
        text.push('\n');
        let flags = progress.get(&exercise.id);
        for group in value_groups(exercise) {
            if let Some(line) = format_row(&exercise.sets, &group, flags) {
                text.push_str(&line);
                text.push('\n');
            }
        }
    }
    text
}

fn value_groups(exercise: &Exercise) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = vec![];
    let mut last_signature = None;
    for (i, set) in exercise.sets.iter().enumerate() {
        let signature = set_signature(set);
        match groups.last_mut() {
            Some(group) if last_signature.as_ref() == Some(&signature) => group.push(i),
            _ => {
                groups.push(vec![i]);
                last_signature = Some(signature);
            }
        }
    }
    groups
}

fn format_row(sets: &[ExerciseSet], indices: &[usize], flags: Option<&Vec<bool>>) -> Option<String> {
    let first = &sets[*indices.first()?];
    let mut line = match first.volume_type {
        VolumeType::SetsReps => format!("{}x{}", indices.len(), first.reps),
        VolumeType::SetsRepsWeight => match first.weight {
            Some(weight) => format!(
                "{}x{}x{}{}",
                indices.len(),
                first.reps,
                format_number(f32::from(weight)),
                first.weight_unit.unwrap_or(WeightUnit::Kg),
            ),
            // A weighted set without a weight still counts; fall back
            // to the plain form rather than dropping the row.
            None => format!("{}x{}", indices.len(), first.reps),
        },
        VolumeType::Duration => {
            let minutes = first.duration?.whole_minutes();
            let (hours, minutes) = (minutes / 60, minutes % 60);
            if hours > 0 && minutes > 0 {
                format!("{hours}h{minutes}m")
            } else if hours > 0 {
                format!("{hours}h")
            } else {
                // "Nm" would read back as meters, so minute-only times
                // use the long suffix.
                format!("{minutes}min")
            }
        }
        VolumeType::Distance => format!(
            "{}{}",
            format_number(f32::from(first.distance?)),
            first.distance_unit.unwrap_or(DistanceUnit::Km),
        ),
        VolumeType::Completion => return None,
    };
    let completed = indices
        .iter()
        .filter(|&&i| flags.is_some_and(|f| f.get(i).copied().unwrap_or_default()))
        .count();
    if completed > 0 {
        line.push(' ');
        line.push_str(&"+".repeat(completed));
    }
    Some(line)
}

fn format_number(value: f32) -> String {
    if (value - value.round()).abs() < f32::EPSILON {
        #[allow(clippy::cast_possible_truncation)]
        let rounded = value.round() as i64;
        format!("{rounded}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{
        Distance, Duration, ExerciseID, Name, Reps, VolumeRowID, Weight, WorkoutExecutionState,
        WorkoutID, apply_parsed, parse_workout_text,
    };

    use super::*;

    fn workout() -> Workout {
        Workout {
            id: WorkoutID::from(1),
            name: Name::new("Push Day").unwrap(),
            exercises: vec![
                Exercise::new(
                    1.into(),
                    Name::new("Bench Press").unwrap(),
                    (0..3)
                        .map(|_| {
                            ExerciseSet::weighted(
                                Reps::clamped(10),
                                Weight::clamped(50.0),
                                WeightUnit::Kg,
                                10.into(),
                            )
                        })
                        .collect(),
                ),
                Exercise::new(
                    2.into(),
                    Name::new("Running").unwrap(),
                    vec![ExerciseSet::distance(
                        Distance::clamped(5.0),
                        DistanceUnit::Km,
                        11.into(),
                    )],
                ),
                Exercise::new(
                    3.into(),
                    Name::new("Plank").unwrap(),
                    vec![ExerciseSet::duration(Duration::clamped(120), 12.into())],
                ),
            ],
        }
    }

    fn progress_for(workout: &Workout) -> Progress {
        WorkoutExecutionState::new(workout.clone()).progress
    }

    #[test]
    fn test_generate_workout_text() {
        let workout = workout();
        let mut progress = progress_for(&workout);
        progress.insert(1.into(), vec![true, false, true]);
        progress.insert(2.into(), vec![true]);
        assert_eq!(
            generate_workout_text(&workout, &progress),
            "\
Bench Press
3x10x50kg ++

Running
5km +

Plank
2min
"
        );
    }

    #[test]
    fn test_generate_groups_by_value_not_by_row_id() {
        let mut workout = workout();
        // Fragmented row ids, identical values: still one line.
        workout.exercises[0].sets[1].volume_row_id = Some(VolumeRowID::from(99));
        workout.exercises[0].sets[2].volume_row_id = None;
        let progress = progress_for(&workout);
        assert!(generate_workout_text(&workout, &progress).starts_with("Bench Press\n3x10x50kg\n"));
    }

    #[test]
    fn test_generate_splits_value_changes_into_rows() {
        let mut workout = workout();
        workout.exercises[0].sets[2].reps = Reps::clamped(8);
        let progress = progress_for(&workout);
        assert!(
            generate_workout_text(&workout, &progress)
                .starts_with("Bench Press\n2x10x50kg\n1x8x50kg\n")
        );
    }

    #[rstest]
    #[case(120, "2min")]
    #[case(3600, "1h")]
    #[case(5400, "1h30m")]
    #[case(45, "1min")]
    fn test_generate_duration_formats(#[case] seconds: u32, #[case] expected: &str) {
        let workout = Workout {
            id: WorkoutID::from(1),
            name: Name::new("W").unwrap(),
            exercises: vec![Exercise::new(
                1.into(),
                Name::new("Plank").unwrap(),
                vec![ExerciseSet::duration(Duration::clamped(seconds), 10.into())],
            )],
        };
        let progress = progress_for(&workout);
        assert_eq!(
            generate_workout_text(&workout, &progress),
            format!("Plank\n{expected}\n")
        );
    }

    #[test]
    fn test_generate_weighted_set_without_weight_falls_back_to_plain_form() {
        let mut workout = workout();
        for set in &mut workout.exercises[0].sets {
            set.weight = None;
        }
        let mut progress = progress_for(&workout);
        progress.insert(1.into(), vec![true, true, false]);
        // The row and its completion markers survive, only the weight
        // part of the line is gone.
        assert!(generate_workout_text(&workout, &progress).starts_with("Bench Press\n3x10 ++\n"));
    }

    #[test]
    fn test_generate_skips_completion_only_sets() {
        let mut workout = workout();
        workout.exercises[2].sets = vec![ExerciseSet::completion(12.into())];
        let progress = progress_for(&workout);
        assert!(generate_workout_text(&workout, &progress).ends_with("Plank\n"));
    }

    #[test]
    fn test_structural_round_trip() {
        let workout = workout();
        let mut progress = progress_for(&workout);
        // Non-contiguous completion: only the count survives.
        progress.insert(1.into(), vec![false, true, true]);
        progress.insert(3.into(), vec![true]);

        let text = generate_workout_text(&workout, &progress);
        let state = WorkoutExecutionState {
            workout: workout.clone(),
            progress: progress.clone(),
        };
        let round_tripped = apply_parsed(&parse_workout_text(&text), &state);

        assert_eq!(round_tripped.workout.exercises.len(), workout.exercises.len());
        for (before, after) in workout
            .exercises
            .iter()
            .zip(&round_tripped.workout.exercises)
        {
            assert_eq!(after.id, before.id);
            assert_eq!(after.name, before.name);
            assert_eq!(after.sets.len(), before.sets.len());
            let completed_before = progress[&before.id].iter().filter(|c| **c).count();
            assert_eq!(
                round_tripped.completed_sets(after.id),
                completed_before,
                "completed count for {}",
                before.name
            );
        }
        // The regenerated text is canonical and stable.
        assert_eq!(
            generate_workout_text(&round_tripped.workout, &round_tripped.progress),
            text
        );
    }

    #[test]
    fn test_round_trip_of_minute_only_duration_stays_a_duration() {
        let text = "Plank\n30min\n";
        let state = WorkoutExecutionState::new(Workout {
            id: WorkoutID::from(1),
            name: Name::new("W").unwrap(),
            exercises: vec![],
        });
        let round_tripped = apply_parsed(&parse_workout_text(text), &state);
        let sets = &round_tripped.workout.exercises[0].sets;
        assert_eq!(sets[0].volume_type, VolumeType::Duration);
        assert_eq!(sets[0].duration, Some(Duration::clamped(1800)));
        assert_eq!(
            generate_workout_text(&round_tripped.workout, &round_tripped.progress),
            text
        );
    }

    #[test]
    fn test_unknown_exercise_progress_is_ignored() {
        let workout = workout();
        let mut progress = progress_for(&workout);
        progress.insert(ExerciseID::from(99), vec![true, true]);
        assert!(!generate_workout_text(&workout, &progress).contains("++"));
    }
}
