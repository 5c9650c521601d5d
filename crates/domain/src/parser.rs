use log::debug;

use crate::{
    Distance, DistanceUnit, Duration, Exercise, ExerciseID, ExerciseSet, Name, Progress, Reps,
    VolumeLine, VolumeRowID, Weight, WeightUnit, Workout, WorkoutExecutionState,
    parse_volume_line, volume_row::MAX_SETS_PER_ROW,
};

/// Parser output for one exercise block, before it is turned into an
/// [`Exercise`] with generated sets.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExercise {
    pub name: String,
    pub volumes: Vec<ParsedVolume>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedVolume {
    Sets {
        sets_planned: u32,
        sets_done: u32,
        reps: u32,
        weight: Option<(f32, WeightUnit)>,
    },
    Distance {
        value: f32,
        unit: DistanceUnit,
        done: bool,
    },
    Time {
        seconds: u32,
        done: bool,
    },
}

/// Splits free-form workout text into per-exercise parsed volume specs.
/// Blocks are separated by blank lines, the first line of a block is the
/// exercise name. Never fails; lines matching no volume form attach as
/// cues to the current exercise.
#[must_use]
pub fn parse_workout_text(text: &str) -> Vec<ParsedExercise> {
    let mut exercises: Vec<ParsedExercise> = vec![];
    let mut current: Option<ParsedExercise> = None;
    let mut coalesce = false;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if let Some(exercise) = current.take() {
                exercises.push(exercise);
            }
            coalesce = false;
            continue;
        }
        let Some(exercise) = current.as_mut() else {
            current = Some(ParsedExercise {
                name: line.to_string(),
                volumes: vec![],
                notes: vec![],
            });
            coalesce = false;
            continue;
        };
        match parse_volume_line(line) {
            Some(volume_line) => {
                append_volume(&mut exercise.volumes, volume_line, coalesce);
                coalesce = true;
            }
            None => {
                exercise.notes.push(line.to_string());
                coalesce = false;
            }
        }
    }
    if let Some(exercise) = current.take() {
        exercises.push(exercise);
    }
    exercises
}

/// Coalesces consecutive matched lines of identical shape into one spec.
/// A cue or blank line in between breaks the run.
fn append_volume(volumes: &mut Vec<ParsedVolume>, line: VolumeLine, coalesce: bool) {
    if coalesce {
        if let Some(last) = volumes.last_mut() {
            match (last, line) {
                (
                    ParsedVolume::Sets {
                        sets_planned,
                        sets_done,
                        reps,
                        weight,
                    },
                    VolumeLine::Sets {
                        sets_planned: line_planned,
                        reps: line_reps,
                        weight: line_weight,
                        plus_count,
                    },
                ) if *reps == line_reps && weight_bits(*weight) == weight_bits(line_weight) => {
                    *sets_planned = sets_planned.saturating_add(line_planned);
                    *sets_done = sets_done.saturating_add(plus_count).min(*sets_planned);
                    return;
                }
                (
                    ParsedVolume::Distance { value, unit, done },
                    VolumeLine::Distance {
                        value: line_value,
                        unit: line_unit,
                        plus_count,
                    },
                ) if value.to_bits() == line_value.to_bits() && *unit == line_unit => {
                    *done |= plus_count > 0;
                    return;
                }
                (
                    ParsedVolume::Time { seconds, done },
                    VolumeLine::Time {
                        seconds: line_seconds,
                        plus_count,
                    },
                ) if *seconds == line_seconds => {
                    *done |= plus_count > 0;
                    return;
                }
                _ => {}
            }
        }
    }
    volumes.push(match line {
        VolumeLine::Sets {
            sets_planned,
            reps,
            weight,
            plus_count,
        } => ParsedVolume::Sets {
            sets_planned,
            sets_done: plus_count.min(sets_planned),
            reps,
            weight,
        },
        VolumeLine::Distance {
            value,
            unit,
            plus_count,
        } => ParsedVolume::Distance {
            value,
            unit,
            done: plus_count > 0,
        },
        VolumeLine::Time {
            seconds,
            plus_count,
        } => ParsedVolume::Time {
            seconds,
            done: plus_count > 0,
        },
    });
}

fn weight_bits(weight: Option<(f32, WeightUnit)>) -> Option<(u32, WeightUnit)> {
    weight.map(|(value, unit)| (value.to_bits(), unit))
}

/// Maps parsed exercises into exercises with generated sets. Identity is
/// preserved across a text edit by pairing each parsed exercise with the
/// first not-yet-consumed existing exercise of the same name; parsed
/// exercises without a name match fall back to positional pairing among
/// the remaining existing ones, anything left over gets a fresh id.
/// Reordering blocks in the text therefore keeps ids stable.
#[must_use]
pub fn convert_to_exercises(parsed: &[ParsedExercise], existing: &Workout) -> Vec<Exercise> {
    pair_existing(parsed, existing)
        .into_iter()
        .zip(parsed)
        .map(|(existing, parsed)| realize_exercise(parsed, existing).0)
        .collect()
}

/// Rebuilds the full execution state from parsed text. Each volume's
/// completed count marks the first entries of its progress slice; the
/// exact positions of non-contiguous completion do not survive the text
/// round trip by design.
#[must_use]
pub fn apply_parsed(
    parsed: &[ParsedExercise],
    state: &WorkoutExecutionState,
) -> WorkoutExecutionState {
    let mut exercises = Vec::with_capacity(parsed.len());
    let mut progress = Progress::new();
    for (existing, parsed) in pair_existing(parsed, &state.workout).into_iter().zip(parsed) {
        let (exercise, flags) = realize_exercise(parsed, existing);
        progress.insert(exercise.id, flags);
        exercises.push(exercise);
    }
    debug!("applied text edit with {} exercises", exercises.len());
    let mut next = WorkoutExecutionState {
        workout: Workout {
            exercises,
            ..state.workout.clone()
        },
        progress,
    };
    next.reconcile_progress();
    next
}

fn pair_existing<'a>(parsed: &[ParsedExercise], existing: &'a Workout) -> Vec<Option<&'a Exercise>> {
    let mut consumed = vec![false; existing.exercises.len()];
    let mut paired: Vec<Option<usize>> = vec![None; parsed.len()];
    for (pi, parsed_exercise) in parsed.iter().enumerate() {
        let name = parsed_exercise.name.trim();
        if let Some(ei) = (0..existing.exercises.len()).find(|&ei| {
            !consumed[ei] && existing.exercises[ei].name.as_str().eq_ignore_ascii_case(name)
        }) {
            consumed[ei] = true;
            paired[pi] = Some(ei);
        }
    }
    let mut remaining = (0..existing.exercises.len()).filter(|&ei| !consumed[ei]);
    for pair in &mut paired {
        if pair.is_none() {
            *pair = remaining.next();
        }
    }
    paired
        .into_iter()
        .map(|pair| pair.map(|ei| &existing.exercises[ei]))
        .collect()
}

fn realize_exercise(parsed: &ParsedExercise, existing: Option<&Exercise>) -> (Exercise, Vec<bool>) {
    let mut sets = vec![];
    let mut flags = vec![];
    for volume in &parsed.volumes {
        let (volume_sets, volume_flags) = realize_volume(volume);
        sets.extend(volume_sets);
        flags.extend(volume_flags);
    }
    let mut exercise = Exercise::new(
        existing.map_or_else(ExerciseID::random, |e| e.id),
        exercise_name(&parsed.name),
        sets,
    );
    exercise.notes = parsed.notes.join("\n");
    if let Some(existing) = existing {
        exercise.category.clone_from(&existing.category);
        exercise.muscle_groups.clone_from(&existing.muscle_groups);
        exercise.equipment.clone_from(&existing.equipment);
        exercise.instructions.clone_from(&existing.instructions);
    }
    (exercise, flags)
}

fn realize_volume(volume: &ParsedVolume) -> (Vec<ExerciseSet>, Vec<bool>) {
    let row_id = VolumeRowID::random();
    match volume {
        ParsedVolume::Sets {
            sets_planned,
            sets_done,
            reps,
            weight,
        } => {
            let count = (*sets_planned).clamp(1, MAX_SETS_PER_ROW) as usize;
            let reps = Reps::clamped(*reps);
            let template = match weight {
                Some((value, unit)) => {
                    ExerciseSet::weighted(reps, Weight::clamped(*value), *unit, row_id)
                }
                None => ExerciseSet::sets_reps(reps, row_id),
            };
            #[allow(clippy::cast_possible_truncation)]
            let done = (*sets_done).min(count as u32) as usize;
            let flags = (0..count).map(|i| i < done).collect();
            (vec![template; count], flags)
        }
        ParsedVolume::Distance { value, unit, done } => (
            vec![ExerciseSet::distance(
                Distance::clamped(*value),
                *unit,
                row_id,
            )],
            vec![*done],
        ),
        ParsedVolume::Time { seconds, done } => (
            vec![ExerciseSet::duration(Duration::clamped(*seconds), row_id)],
            vec![*done],
        ),
    }
}

fn exercise_name(raw: &str) -> Name {
    Name::new(raw).unwrap_or_else(|_| {
        let truncated = raw.trim().chars().take(80).collect::<String>();
        Name::new(&truncated).unwrap_or_else(|_| Name::new("Exercise").unwrap())
    })
}
