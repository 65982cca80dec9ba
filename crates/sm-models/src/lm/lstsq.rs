//! Least-squares solver over a column-scaled design matrix
//!
//! Every design column is divided by its Euclidean norm before factoring, so
//! the rank check and the SVD see unit-norm columns regardless of the units
//! of each predictor. Results are mapped back to the original scale.

use nalgebra::{DMatrix, DVector, Dyn, SVD};

use crate::base::{ModelError, Result};
use crate::lm::ols::{Matrix, Vector};

/// Factorized design matrix, ready to solve for any right-hand side
pub(crate) struct LeastSquares {
    /// Norm of each original column (1.0 for all-zero columns)
    scale: Vec<f64>,
    /// Absolute QR pivots of the scaled design
    pivots: Vec<f64>,
    svd: SVD<f64, Dyn, Dyn>,
}

impl LeastSquares {
    /// Factorize `x` (n x k, n >= k)
    pub fn new(x: &Matrix) -> Result<Self> {
        let (n, k) = x.dim();
        let scale: Vec<f64> = x
            .columns()
            .into_iter()
            .map(|col| {
                let norm = col.dot(&col).sqrt();
                if norm > 0.0 { norm } else { 1.0 }
            })
            .collect();
        let scaled = DMatrix::from_fn(n, k, |i, j| x[(i, j)] / scale[j]);

        // A unit-norm column's pivot is its distance to the span of the
        // columns before it.
        let r = scaled.clone().qr().r();
        let pivots = (0..k).map(|j| r[(j, j)].abs()).collect();

        let svd = scaled
            .try_svd(true, true, f64::EPSILON, 0)
            .ok_or_else(|| ModelError::NumericalError {
                message: "SVD did not converge".to_string(),
                operation: "least_squares".to_string(),
            })?;

        Ok(Self { scale, pivots, svd })
    }

    /// First column whose scaled pivot falls below `tolerance`, if any
    pub fn first_deficient_column(&self, tolerance: f64) -> Option<usize> {
        self.pivots.iter().position(|&p| p.is_nan() || p < tolerance)
    }

    /// Coefficients minimizing `‖y - X b‖²`
    pub fn solve(&self, y: &Vector) -> Result<Vector> {
        let rhs = DVector::from_iterator(y.len(), y.iter().copied());
        let beta = self
            .svd
            .solve(&rhs, 0.0)
            .map_err(|e| ModelError::NumericalError {
                message: format!("SVD least squares failed: {}", e),
                operation: "least_squares".to_string(),
            })?;

        Ok(beta
            .iter()
            .zip(&self.scale)
            .map(|(b, s)| b / s)
            .collect())
    }

    /// `(XᵀX)⁻¹` of the original design, from `V Σ⁻² Vᵀ` of the scaled one
    pub fn xtx_inverse(&self) -> Result<Matrix> {
        let v_t = self.svd.v_t.as_ref().ok_or_else(|| ModelError::NumericalError {
            message: "right singular vectors were not computed".to_string(),
            operation: "xtx_inverse".to_string(),
        })?;
        let inv_sq: Vec<f64> = self
            .svd
            .singular_values
            .iter()
            .map(|s| 1.0 / (s * s))
            .collect();

        let k = self.scale.len();
        Ok(Matrix::from_shape_fn((k, k), |(a, b)| {
            let scaled: f64 = inv_sq
                .iter()
                .enumerate()
                .map(|(l, w)| v_t[(l, a)] * v_t[(l, b)] * w)
                .sum();
            scaled / (self.scale[a] * self.scale[b])
        }))
    }

    /// Diagonal of the hat matrix, the squared row norms of `U`
    pub fn leverage(&self) -> Result<Vector> {
        let u = self.svd.u.as_ref().ok_or_else(|| ModelError::NumericalError {
            message: "left singular vectors were not computed".to_string(),
            operation: "leverage".to_string(),
        })?;
        Ok(u.row_iter().map(|row| row.norm_squared()).collect())
    }
}
