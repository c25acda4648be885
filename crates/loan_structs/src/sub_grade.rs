use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a sub-grade label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid sub-grade {0:?}: expected a letter A-G followed by a step 1-5")]
pub struct SubGradeParseError(pub String);

/// Letter credit grade, from best (A) to worst (G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Grade {
    /// All grades, best first.
    pub const ALL: [Self; 7] = [
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::G,
    ];

    /// Integer value of the grade: A maps to 7, G maps to 1.
    #[must_use]
    pub const fn base_value(self) -> u8 {
        match self {
            Self::A => 7,
            Self::B => 6,
            Self::C => 5,
            Self::D => 4,
            Self::E => 3,
            Self::F => 2,
            Self::G => 1,
        }
    }

    const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
        }
    }

    const fn from_letter(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            'G' => Some(Self::G),
            _ => None,
        }
    }
}

/// Lender sub-grade such as `B3`: a letter grade refined by a step in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubGrade {
    grade: Grade,
    step: u8,
}

impl SubGrade {
    /// Smallest sub-step within a grade.
    pub const MIN_STEP: u8 = 1;
    /// Largest sub-step within a grade.
    pub const MAX_STEP: u8 = 5;
    /// Ordinal distance between consecutive sub-steps.
    pub const STEP_OFFSET: f64 = 0.2;

    /// Creates a sub-grade, returning `None` if the step is outside `1..=5`.
    #[must_use]
    pub const fn new(grade: Grade, step: u8) -> Option<Self> {
        if step >= Self::MIN_STEP && step <= Self::MAX_STEP {
            Some(Self { grade, step })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn grade(self) -> Grade {
        self.grade
    }

    #[must_use]
    pub const fn step(self) -> u8 {
        self.step
    }

    /// Ordinal encoding: grade value plus `(step - 1) * 0.2`.
    ///
    /// `A1` is 7.0, `A5` is 7.8, `B3` is 6.4 and `G1` is 1.0.
    #[must_use]
    pub fn ordinal(self) -> f64 {
        f64::from(self.grade.base_value()) + f64::from(self.step - 1) * Self::STEP_OFFSET
    }

    /// Every sub-grade from `A1` to `G5`.
    pub fn all() -> impl Iterator<Item = Self> {
        Grade::ALL.into_iter().flat_map(|grade| {
            (Self::MIN_STEP..=Self::MAX_STEP).map(move |step| Self { grade, step })
        })
    }
}

impl fmt::Display for SubGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.grade.letter(), self.step)
    }
}

impl FromStr for SubGrade {
    type Err = SubGradeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();

        let parsed = match (chars.next(), chars.next(), chars.next()) {
            (Some(letter), Some(digit), None) => Grade::from_letter(letter.to_ascii_uppercase())
                .zip(digit.to_digit(10))
                .and_then(|(grade, step)| u8::try_from(step).ok().and_then(|s| Self::new(grade, s))),
            _ => None,
        };

        parsed.ok_or_else(|| SubGradeParseError(s.to_string()))
    }
}
