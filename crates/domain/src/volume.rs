use std::fmt::{self, Display};

use derive_more::{Display, Into};

/// How the quantity of work of a set is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VolumeType {
    SetsReps,
    SetsRepsWeight,
    Duration,
    Distance,
    Completion,
}

impl VolumeType {
    /// Types that are always backed by exactly one set.
    #[must_use]
    pub fn is_single_set(self) -> bool {
        matches!(
            self,
            VolumeType::Duration | VolumeType::Distance | VolumeType::Completion
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WeightUnit {
    Kg,
    Lb,
}

impl Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                WeightUnit::Kg => "kg",
                WeightUnit::Lb => "lb",
            }
        )
    }
}

impl TryFrom<&str> for WeightUnit {
    type Error = UnitError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "kg" => Ok(WeightUnit::Kg),
            "lb" => Ok(WeightUnit::Lb),
            _ => Err(UnitError::UnknownUnit(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DistanceUnit {
    Km,
    Mi,
    M,
}

impl Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                DistanceUnit::Km => "km",
                DistanceUnit::Mi => "mi",
                DistanceUnit::M => "m",
            }
        )
    }
}

impl TryFrom<&str> for DistanceUnit {
    type Error = UnitError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "km" => Ok(DistanceUnit::Km),
            "mi" => Ok(DistanceUnit::Mi),
            "m" => Ok(DistanceUnit::M),
            _ => Err(UnitError::UnknownUnit(value.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),
}

#[derive(Debug, Display, Clone, Copy, Into, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reps(u32);

impl Reps {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 999;

    pub fn new(value: u32) -> Result<Self, RepsError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(RepsError::OutOfRange(value));
        }

        Ok(Self(value))
    }

    /// Sanitizing constructor used on UI edits. Out-of-range values are
    /// clamped, never rejected.
    #[must_use]
    pub fn clamped(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }
}

impl TryFrom<&str> for Reps {
    type Error = RepsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.parse::<u32>() {
            Ok(parsed_value) => Reps::new(parsed_value),
            Err(_) => Err(RepsError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RepsError {
    #[error("Reps must be in the range 1 to 999 ({0})")]
    OutOfRange(u32),
    #[error("Reps must be an integer")]
    ParseError,
}

#[derive(Debug, Display, Clone, Copy, Into, PartialEq, PartialOrd)]
pub struct Weight(f32);

impl Weight {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 9999.0;

    pub fn new(value: f32) -> Result<Self, WeightError> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(WeightError::OutOfRange(value));
        }

        Ok(Self(value))
    }

    #[must_use]
    pub fn clamped(value: f32) -> Self {
        if !value.is_finite() {
            return Self(Self::MIN);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }
}

impl TryFrom<&str> for Weight {
    type Error = WeightError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.parse::<f32>() {
            Ok(parsed_value) => Weight::new(parsed_value),
            Err(_) => Err(WeightError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WeightError {
    #[error("Weight must be in the range 0 to 9999 ({0})")]
    OutOfRange(f32),
    #[error("Weight must be a decimal")]
    ParseError,
}

/// Time under effort of a single set, in seconds.
#[derive(Debug, Display, Clone, Copy, Into, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(u32);

impl Duration {
    /// 0.1 minutes, the smallest duration editable as a row.
    pub const MIN: u32 = 6;
    /// 999 minutes.
    pub const MAX: u32 = 59_940;

    pub fn new(seconds: u32) -> Result<Self, DurationError> {
        if !(Self::MIN..=Self::MAX).contains(&seconds) {
            return Err(DurationError::OutOfRange(seconds));
        }

        Ok(Self(seconds))
    }

    #[must_use]
    pub fn clamped(seconds: u32) -> Self {
        Self(seconds.clamp(Self::MIN, Self::MAX))
    }

    /// Rounds up to whole minutes from seconds, with a minimum of one
    /// minute so that a serialized time spec always has a component.
    #[must_use]
    pub fn whole_minutes(self) -> u32 {
        self.0.div_ceil(60).max(1)
    }

    #[must_use]
    pub fn as_minutes(self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        {
            self.0 as f32 / 60.0
        }
    }

    /// Row-level edits are expressed in minutes.
    #[must_use]
    pub fn from_minutes(minutes: f32) -> Self {
        if !minutes.is_finite() {
            return Self(Self::MIN);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self::clamped((minutes.clamp(0.1, 999.0) * 60.0).round() as u32)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DurationError {
    #[error("Duration must be in the range 6 to 59940 s ({0})")]
    OutOfRange(u32),
}

#[derive(Debug, Display, Clone, Copy, Into, PartialEq, PartialOrd)]
pub struct Distance(f32);

impl Distance {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 999.0;

    pub fn new(value: f32) -> Result<Self, DistanceError> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DistanceError::OutOfRange(value));
        }

        Ok(Self(value))
    }

    #[must_use]
    pub fn clamped(value: f32) -> Self {
        if !value.is_finite() {
            return Self(Self::MIN);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DistanceError {
    #[error("Distance must be in the range 0.1 to 999 ({0})")]
    OutOfRange(f32),
}
