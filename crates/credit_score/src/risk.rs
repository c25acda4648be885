//! Credit score and risk category derived from a default probability.
//!
//! The score is a FICO-like number on the 300–850 range computed purely from
//! the model output: a certain non-default maps to 850, a certain default
//! to 300.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lowest possible score.
pub const MIN_SCORE: f64 = 300.0;

/// Highest possible score.
pub const MAX_SCORE: f64 = 850.0;

const SCORE_SPAN: f64 = MAX_SCORE - MIN_SCORE;

/// Maps a default probability to a score in `[300, 850]`.
///
/// Probabilities outside `[0, 1]` are clamped first; NaN is treated as a
/// certain default.
#[must_use]
pub fn score(probability: f64) -> f64 {
    let p = if probability.is_nan() {
        1.0
    } else {
        probability.clamp(0.0, 1.0)
    };
    SCORE_SPAN.mul_add(-p, MAX_SCORE)
}

/// Coarse risk band of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl RiskCategory {
    /// All categories from worst to best.
    pub const ALL: [Self; 4] = [Self::Poor, Self::Acceptable, Self::Good, Self::Excellent];

    /// Exclusive lower score bound of the category; `Poor` has none.
    #[must_use]
    pub const fn lower_bound(self) -> Option<f64> {
        match self {
            Self::Excellent => Some(740.0),
            Self::Good => Some(670.0),
            Self::Acceptable => Some(580.0),
            Self::Poor => None,
        }
    }

    /// Category of a score. Bounds are exclusive: 740 is `Good`, not `Excellent`.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|c| c.lower_bound().is_some_and(|bound| score > bound))
            .unwrap_or(Self::Poor)
    }

    /// Category for a default probability.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        Self::from_score(score(probability))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Acceptable => "Acceptable",
            Self::Poor => "Poor",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRiskCategoryError(String);

impl fmt::Display for ParseRiskCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown risk category: {}", self.0)
    }
}

impl core::error::Error for ParseRiskCategoryError {}

impl FromStr for RiskCategory {
    type Err = ParseRiskCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseRiskCategoryError(s.to_string()))
    }
}
