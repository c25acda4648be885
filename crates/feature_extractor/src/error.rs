use thiserror::Error;

use crate::CategoricalField;

/// A categorical or ordinal value outside its fixed encoding table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("unknown {field} {value:?}; expected one of: {}", allowed.join(", "))]
    UnknownCategory {
        field: CategoricalField,
        value: String,
        allowed: Vec<String>,
    },

    #[error(transparent)]
    SubGrade(#[from] loan_structs::SubGradeParseError),

    #[error("unknown loan term {0:?}; expected \"36 months\" or \"60 months\"")]
    Term(String),

    #[error("unknown verification status {0:?}; expected \"Not Verified\", \"Source Verified\" or \"Verified\"")]
    VerificationStatus(String),
}

/// A form value outside its declared bounds.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field} = {value} is outside the allowed range [{min}, {max}]")]
pub struct BoundsError {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Errors raised while turning an application form into a feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error("unknown form field {0:?}")]
    UnknownField(String),

    #[error("form field {field} expects a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("assembled {actual} features but schema {schema} expects {expected}")]
    Width {
        schema: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised while deriving the training matrix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    #[error("no usable rows left after cleaning ({skipped} rows skipped)")]
    EmptyDataset { skipped: usize },
}
