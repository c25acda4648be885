use std::path::PathBuf;

use thiserror::Error;

/// Errors raised when a fitted transform or the model receives data it
/// cannot handle.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{stage} expects {expected} features, got {actual}")]
    Width {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("cannot fit {stage} on an empty matrix")]
    Empty { stage: &'static str },

    #[error("rows have inconsistent widths")]
    Ragged,

    #[error("cannot keep {requested} components from {available} features")]
    Components { requested: usize, available: usize },

    #[error("tensor conversion failed: {0}")]
    Tensor(String),
}

/// Errors raised while writing or reading an artifact bundle.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported bundle format version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("inconsistent bundle: {0}")]
    Inconsistent(String),

    #[error("model weights {path}: {message}")]
    Weights { path: PathBuf, message: String },
}
