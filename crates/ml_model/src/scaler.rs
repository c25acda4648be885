//! Standard scaling fitted on the training split.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::TransformError;

/// Per-feature affine transform to zero mean and unit variance.
///
/// Columns are positional: the order at transform time must be the order
/// the scaler was fitted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    /// Population standard deviation per column; constant columns use 1.0.
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fits the scaler on a row-major matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is empty or ragged.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, TransformError> {
        let matrix = to_matrix(rows, "scaler")?;

        let mean = matrix
            .mean_axis(Axis(0))
            .ok_or(TransformError::Empty { stage: "scaler" })?;
        let scale = matrix
            .std_axis(Axis(0), 0.0)
            .mapv(|std| if std.abs() < f64::EPSILON { 1.0 } else { std });

        Ok(Self {
            mean: mean.to_vec(),
            scale: scale.to_vec(),
        })
    }

    /// Number of features the scaler was fitted on.
    #[must_use]
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Scales a matrix of rows.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Width`] if the rows do not have the fitted width.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, TransformError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = to_matrix(rows, "scaler")?;
        if matrix.ncols() != self.width() {
            return Err(TransformError::Width {
                stage: "scaler",
                expected: self.width(),
                actual: matrix.ncols(),
            });
        }

        let mean = Array1::from(self.mean.clone());
        let scale = Array1::from(self.scale.clone());
        let scaled = (&matrix - &mean) / &scale;

        Ok(from_matrix(&scaled))
    }

    /// Scales a single row.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Width`] if the row does not have the fitted width.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, TransformError> {
        if row.len() != self.width() {
            return Err(TransformError::Width {
                stage: "scaler",
                expected: self.width(),
                actual: row.len(),
            });
        }

        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}

/// Builds a dense matrix from equally sized rows.
pub(crate) fn to_matrix(rows: &[Vec<f64>], stage: &'static str) -> Result<Array2<f64>, TransformError> {
    let Some(first) = rows.first() else {
        return Err(TransformError::Empty { stage });
    };
    let width = first.len();
    if width == 0 {
        return Err(TransformError::Empty { stage });
    }
    if rows.iter().any(|r| r.len() != width) {
        return Err(TransformError::Ragged);
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), width), flat).map_err(|_| TransformError::Ragged)
}

pub(crate) fn from_matrix(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}
