//! Principal component projection applied after scaling.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TransformError;
use crate::scaler::{from_matrix, to_matrix};

/// Linear projection onto the leading principal components of the
/// training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaProjector {
    /// Column means of the data the projector was fitted on.
    pub mean: Vec<f64>,
    /// Unit-length components, one row per output feature.
    pub components: Vec<Vec<f64>>,
    /// Variance captured by each component.
    pub explained_variance: Vec<f64>,
}

impl PcaProjector {
    /// Fits the projection keeping `n_components` components.
    ///
    /// Components are the eigenvectors of the sample covariance matrix with
    /// the largest eigenvalues, in descending order, sign-normalised so that
    /// the entry with the largest magnitude is positive.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is empty or ragged, or if more
    /// components are requested than there are features.
    pub fn fit(rows: &[Vec<f64>], n_components: usize) -> Result<Self, TransformError> {
        let matrix = to_matrix(rows, "projector")?;
        let (n_rows, width) = matrix.dim();

        if n_components == 0 || n_components > width {
            return Err(TransformError::Components {
                requested: n_components,
                available: width,
            });
        }

        let mean = matrix
            .mean_axis(Axis(0))
            .ok_or(TransformError::Empty { stage: "projector" })?;
        let centered = &matrix - &mean;
        let denominator = (n_rows.max(2) - 1) as f64;
        let covariance = centered.t().dot(&centered) / denominator;

        let eigen = SymmetricEigen::new(DMatrix::from_fn(width, width, |i, j| covariance[[i, j]]));
        let eigenvalues = eigen.eigenvalues;
        let eigenvectors = eigen.eigenvectors;

        let mut order: Vec<usize> = (0..width).collect();
        order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

        let mut components = Vec::with_capacity(n_components);
        let mut explained_variance = Vec::with_capacity(n_components);

        for (index, &column) in order.iter().take(n_components).enumerate() {
            let mut component: Vec<f64> = eigenvectors.column(column).iter().copied().collect();
            normalize_sign(&mut component);

            let variance = eigenvalues[column].max(0.0);
            debug!(component = index, variance, "Fitted principal component");

            explained_variance.push(variance);
            components.push(component);
        }

        Ok(Self {
            mean: mean.to_vec(),
            components,
            explained_variance,
        })
    }

    /// Width of the rows the projector accepts.
    #[must_use]
    pub fn input_width(&self) -> usize {
        self.mean.len()
    }

    /// Width of the projected rows.
    #[must_use]
    pub fn output_width(&self) -> usize {
        self.components.len()
    }

    /// Projects a matrix of rows onto the fitted components.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Width`] if the rows do not have the fitted width.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, TransformError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = to_matrix(rows, "projector")?;
        if matrix.ncols() != self.input_width() {
            return Err(TransformError::Width {
                stage: "projector",
                expected: self.input_width(),
                actual: matrix.ncols(),
            });
        }

        let mean = Array1::from(self.mean.clone());
        let components = to_matrix(&self.components, "projector")?;
        let projected = (&matrix - &mean).dot(&components.t());

        Ok(from_matrix(&projected))
    }

    /// Projects a single row.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Width`] if the row does not have the fitted width.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, TransformError> {
        let mut projected = self.transform(&[row.to_vec()])?;
        projected.pop().ok_or(TransformError::Empty { stage: "projector" })
    }
}

fn normalize_sign(vector: &mut [f64]) {
    let dominant = vector
        .iter()
        .copied()
        .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
    if dominant < 0.0 {
        vector.iter_mut().for_each(|v| *v = -*v);
    }
}
