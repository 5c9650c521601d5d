use crate::{DistanceUnit, WeightUnit};

/// One recognized line of volume notation. A line that matches no form is
/// not an error, it is a cue the caller attaches to the current exercise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeLine {
    Sets {
        sets_planned: u32,
        reps: u32,
        weight: Option<(f32, WeightUnit)>,
        plus_count: u32,
    },
    Distance {
        value: f32,
        unit: DistanceUnit,
        plus_count: u32,
    },
    Time {
        seconds: u32,
        plus_count: u32,
    },
}

impl VolumeLine {
    #[must_use]
    pub fn plus_count(&self) -> u32 {
        match self {
            VolumeLine::Sets { plus_count, .. }
            | VolumeLine::Distance { plus_count, .. }
            | VolumeLine::Time { plus_count, .. } => *plus_count,
        }
    }
}

/// Classifies one line of workout text. Forms are tried in priority order:
/// sets (`3x10`, `3x10x50kg`), distance (`10km`), time (`1h30m`, `45min`).
/// A bare minute spec like `30m` is claimed by the distance form as meters;
/// the serializer therefore writes minute-only times with the `min` suffix.
#[must_use]
pub fn parse_volume_line(line: &str) -> Option<VolumeLine> {
    let line = line.trim();
    sets_spec(line)
        .or_else(|| distance_spec(line))
        .or_else(|| time_spec(line))
}

fn sets_spec(line: &str) -> Option<VolumeLine> {
    let mut scanner = Scanner::new(line);
    let sets_planned = scanner.integer()?;
    if !scanner.symbol("x") {
        return None;
    }
    let reps = scanner.integer()?;
    let weight = if scanner.symbol("x") {
        let value = scanner.number()?;
        let unit = if scanner.symbol("kg") {
            WeightUnit::Kg
        } else if scanner.symbol("lb") {
            WeightUnit::Lb
        } else {
            return None;
        };
        Some((value, unit))
    } else {
        None
    };
    let plus_count = scanner.tail_plus_count()?;
    Some(VolumeLine::Sets {
        sets_planned,
        reps,
        weight,
        plus_count,
    })
}

fn distance_spec(line: &str) -> Option<VolumeLine> {
    let mut scanner = Scanner::new(line);
    let value = scanner.number()?;
    let unit = if scanner.symbol("km") {
        DistanceUnit::Km
    } else if scanner.symbol("mi") {
        DistanceUnit::Mi
    } else if scanner.symbol("m") {
        DistanceUnit::M
    } else {
        return None;
    };
    let plus_count = scanner.tail_plus_count()?;
    Some(VolumeLine::Distance {
        value,
        unit,
        plus_count,
    })
}

fn time_spec(line: &str) -> Option<VolumeLine> {
    let mut scanner = Scanner::new(line);
    let mut seconds = 0u32;
    let mut matched = false;

    let checkpoint = scanner.rest;
    if let Some(hours) = scanner.integer() {
        if scanner.symbol("h") {
            seconds = hours.checked_mul(3600)?;
            matched = true;
        } else {
            scanner.rest = checkpoint;
        }
    }

    let checkpoint = scanner.rest;
    if let Some(minutes) = scanner.integer() {
        // "min" must be tried before "m" or the scanner would strand "in".
        if scanner.symbol("min") || scanner.symbol("m") {
            seconds = seconds.checked_add(minutes.checked_mul(60)?)?;
            matched = true;
        } else {
            scanner.rest = checkpoint;
        }
    }

    if !matched {
        return None;
    }
    let plus_count = scanner.tail_plus_count()?;
    Some(VolumeLine::Time {
        seconds,
        plus_count,
    })
}

struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    /// Consumes one or more ASCII digits. Values that overflow `u32` fail
    /// the form (the line degrades to a cue).
    fn integer(&mut self) -> Option<u32> {
        let len = digit_prefix_len(self.rest, 0);
        if len == 0 {
            return None;
        }
        let value = self.rest[..len].parse().ok()?;
        self.rest = &self.rest[len..];
        Some(value)
    }

    /// Consumes `INT [ "." INT ]`.
    fn number(&mut self) -> Option<f32> {
        let mut len = digit_prefix_len(self.rest, 0);
        if len == 0 {
            return None;
        }
        if self.rest[len..].starts_with('.') {
            let fraction_len = digit_prefix_len(self.rest, len + 1);
            if fraction_len > 0 {
                len += 1 + fraction_len;
            }
        }
        let value = self.rest[..len].parse().ok()?;
        self.rest = &self.rest[len..];
        Some(value)
    }

    /// Consumes an ASCII keyword case-insensitively.
    fn symbol(&mut self, keyword: &str) -> bool {
        if self
            .rest
            .get(..keyword.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
        {
            self.rest = &self.rest[keyword.len()..];
            true
        } else {
            false
        }
    }

    /// The remainder may contain only `+` and whitespace; returns the
    /// number of `+` characters regardless of interleaving whitespace.
    fn tail_plus_count(self) -> Option<u32> {
        let mut count = 0;
        for c in self.rest.chars() {
            if c == '+' {
                count += 1;
            } else if !c.is_whitespace() {
                return None;
            }
        }
        Some(count)
    }
}

fn digit_prefix_len(s: &str, start: usize) -> usize {
    s[start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count()
}
