use core::fmt;

use serde::{Deserialize, Serialize};

use crate::EncodingError;

/// Home ownership values known to the model, in encoding order.
pub const HOME_OWNERSHIP_VALUES: [&str; 6] = ["ANY", "MORTGAGE", "NONE", "OTHER", "OWN", "RENT"];

/// Loan purposes known to the model, in encoding order.
pub const PURPOSE_VALUES: [&str; 14] = [
    "car",
    "credit_card",
    "debt_consolidation",
    "educational",
    "home_improvement",
    "house",
    "major_purchase",
    "medical",
    "moving",
    "other",
    "renewable_energy",
    "small_business",
    "vacation",
    "wedding",
];

/// Categorical fields expanded by one-hot encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    HomeOwnership,
    Purpose,
}

impl CategoricalField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HomeOwnership => "home_ownership",
            Self::Purpose => "purpose",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of values each categorical field may take.
///
/// Persisted with the trained artifacts so training and serving always
/// encode against the same lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUniverse {
    pub home_ownership: Vec<String>,
    pub purpose: Vec<String>,
}

impl Default for CategoryUniverse {
    fn default() -> Self {
        Self {
            home_ownership: HOME_OWNERSHIP_VALUES.iter().map(|v| (*v).to_string()).collect(),
            purpose: PURPOSE_VALUES.iter().map(|v| (*v).to_string()).collect(),
        }
    }
}

impl CategoryUniverse {
    /// Returns the ordered values allowed for a field.
    #[must_use]
    pub fn values(&self, field: CategoricalField) -> &[String] {
        match field {
            CategoricalField::HomeOwnership => &self.home_ownership,
            CategoricalField::Purpose => &self.purpose,
        }
    }

    /// Number of one-hot columns a field expands to.
    #[must_use]
    pub fn width(&self, field: CategoricalField) -> usize {
        self.values(field).len()
    }

    /// Position of a value within the field's universe.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::UnknownCategory`] if the value is not part of
    /// the universe.
    pub fn index_of(&self, field: CategoricalField, value: &str) -> Result<usize, EncodingError> {
        let values = self.values(field);
        values
            .iter()
            .position(|v| v == value.trim())
            .ok_or_else(|| EncodingError::UnknownCategory {
                field,
                value: value.to_string(),
                allowed: values.to_vec(),
            })
    }

    /// One-hot encodes a value: a single 1.0 at the value's position.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::UnknownCategory`] for values outside the
    /// universe instead of emitting an all-zero vector.
    pub fn one_hot(&self, field: CategoricalField, value: &str) -> Result<Vec<f64>, EncodingError> {
        let idx = self.index_of(field, value)?;
        let mut encoded = vec![0.0; self.width(field)];
        if let Some(slot) = encoded.get_mut(idx) {
            *slot = 1.0;
        }
        Ok(encoded)
    }
}
