use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CategoricalField, CategoryUniverse};

/// Width of the raw schema.
pub const RAW_FEATURE_COUNT: usize = 13;

/// Width of the expanded schema with the default category universe.
pub const EXPANDED_FEATURE_COUNT: usize = 32;

/// Raw schema columns, in model order.
pub const RAW_COLUMNS: [&str; RAW_FEATURE_COUNT] = [
    "loan_amnt",
    "int_rate",
    "installment",
    "annual_inc",
    "dti",
    "delinq_2yrs",
    "inq_last_6mths",
    "open_acc",
    "pub_rec",
    "revol_bal",
    "revol_util",
    "total_acc",
    "emp_length",
];

/// Expanded schema columns preceding the one-hot blocks.
pub const EXPANDED_LEADING_COLUMNS: [&str; 9] = [
    "annual_inc",
    "dti",
    "sub_grade",
    "open_acc",
    "total_acc",
    "inq_last_6mths",
    "delinq_2yrs",
    "int_rate",
    "pub_rec",
];

/// Expanded schema columns following the one-hot blocks.
pub const EXPANDED_TRAILING_COLUMNS: [&str; 3] = ["term", "verification_status", "installment"];

/// Error returned for an unrecognised schema identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown feature schema {0:?}")]
pub struct UnknownSchemaError(pub String);

/// Versioned layout of the feature vector consumed by the scaler and model.
///
/// The identifier is persisted with the artifacts; a bundle can only be
/// served with the schema it was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureSchema {
    /// The 13 raw numeric loan attributes.
    #[serde(rename = "loan-raw/v1")]
    Raw,
    /// Numeric attributes plus sub-grade ordinal, one-hot home ownership and
    /// purpose, term and verification codes.
    #[serde(rename = "loan-expanded/v1")]
    Expanded,
}

impl FeatureSchema {
    pub const ALL: [Self; 2] = [Self::Raw, Self::Expanded];

    /// Stable identifier stored in the artifact manifest.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Raw => "loan-raw/v1",
            Self::Expanded => "loan-expanded/v1",
        }
    }

    /// Ordered feature names for this schema.
    #[must_use]
    pub fn feature_names(self, universe: &CategoryUniverse) -> Vec<String> {
        match self {
            Self::Raw => RAW_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            Self::Expanded => {
                let one_hot = |field: CategoricalField| {
                    universe
                        .values(field)
                        .iter()
                        .map(move |v| format!("{}_{v}", field.as_str()))
                };

                EXPANDED_LEADING_COLUMNS
                    .iter()
                    .map(|c| (*c).to_string())
                    .chain(one_hot(CategoricalField::HomeOwnership))
                    .chain(one_hot(CategoricalField::Purpose))
                    .chain(EXPANDED_TRAILING_COLUMNS.iter().map(|c| (*c).to_string()))
                    .collect()
            }
        }
    }

    /// Number of features this schema produces.
    #[must_use]
    pub fn width(self, universe: &CategoryUniverse) -> usize {
        match self {
            Self::Raw => RAW_FEATURE_COUNT,
            Self::Expanded => {
                EXPANDED_LEADING_COLUMNS.len()
                    + universe.width(CategoricalField::HomeOwnership)
                    + universe.width(CategoricalField::Purpose)
                    + EXPANDED_TRAILING_COLUMNS.len()
            }
        }
    }

    /// CSV columns a training file must provide for this schema.
    #[must_use]
    pub fn required_columns(self) -> Vec<&'static str> {
        let mut columns = vec!["loan_status"];
        match self {
            Self::Raw => columns.extend(RAW_COLUMNS),
            Self::Expanded => {
                columns.extend(EXPANDED_LEADING_COLUMNS);
                columns.extend(["home_ownership", "purpose"]);
                columns.extend(EXPANDED_TRAILING_COLUMNS);
            }
        }
        columns
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FeatureSchema {
    type Err = UnknownSchemaError;

    /// Accepts the full identifier or the short names `raw` / `expanded`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "loan-raw/v1" | "raw" => Ok(Self::Raw),
            "loan-expanded/v1" | "expanded" => Ok(Self::Expanded),
            _ => Err(UnknownSchemaError(s.to_string())),
        }
    }
}

/// An ordered numeric feature vector tagged with its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub schema: FeatureSchema,
    pub values: Vec<f64>,
}

impl FeatureVector {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_widths() {
        let universe = CategoryUniverse::default();
        assert_eq!(FeatureSchema::Raw.width(&universe), RAW_FEATURE_COUNT);
        assert_eq!(FeatureSchema::Expanded.width(&universe), EXPANDED_FEATURE_COUNT);

        for schema in FeatureSchema::ALL {
            assert_eq!(schema.feature_names(&universe).len(), schema.width(&universe));
        }
    }

    #[test]
    fn test_expanded_feature_order() {
        let names = FeatureSchema::Expanded.feature_names(&CategoryUniverse::default());
        assert_eq!(names[2], "sub_grade");
        assert_eq!(names[9], "home_ownership_ANY");
        assert_eq!(names[14], "home_ownership_RENT");
        assert_eq!(names[15], "purpose_car");
        assert_eq!(names[28], "purpose_wedding");
        assert_eq!(names[29], "term");
        assert_eq!(names[30], "verification_status");
        assert_eq!(names[31], "installment");
    }

    #[test]
    fn test_schema_ids_round_trip() {
        for schema in FeatureSchema::ALL {
            assert_eq!(schema.id().parse::<FeatureSchema>(), Ok(schema));
            let json = serde_json::to_string(&schema).expect("serialize");
            assert_eq!(json, format!("\"{}\"", schema.id()));
        }
        assert_eq!("expanded".parse::<FeatureSchema>(), Ok(FeatureSchema::Expanded));
        assert!("loan-raw/v2".parse::<FeatureSchema>().is_err());
    }

    #[test]
    fn test_required_columns() {
        let raw = FeatureSchema::Raw.required_columns();
        assert!(raw.contains(&"loan_status"));
        assert!(raw.contains(&"emp_length"));
        assert_eq!(raw.len(), 14);

        let expanded = FeatureSchema::Expanded.required_columns();
        assert!(expanded.contains(&"sub_grade"));
        assert!(expanded.contains(&"purpose"));
        assert!(!expanded.contains(&"emp_length"));
    }
}
