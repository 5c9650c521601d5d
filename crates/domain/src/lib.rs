#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod exercise;
mod line;
mod name;
mod parser;
mod serializer;
mod volume;
mod volume_row;
mod workout;

pub use exercise::{Exercise, ExerciseID, ExerciseSet};
pub use line::{VolumeLine, parse_volume_line};
pub use name::{Name, NameError};
pub use parser::{
    ParsedExercise, ParsedVolume, apply_parsed, convert_to_exercises, parse_workout_text,
};
pub use serializer::generate_workout_text;
pub use volume::{
    Distance, DistanceError, DistanceUnit, Duration, DurationError, Reps, RepsError, UnitError,
    VolumeType, Weight, WeightError, WeightUnit,
};
pub use volume_row::{MAX_SETS_PER_ROW, RowKey, RowUpdate, VolumeRow, VolumeRowID};
pub use workout::{Progress, Workout, WorkoutExecutionState, WorkoutID};
