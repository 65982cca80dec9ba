//! Linear regression models
//!
//! Ordinary least squares with an intercept, solved by SVD of the
//! column-scaled design matrix. The fitted [`OlsModel`] carries the
//! coefficient table, fit statistics and per-row influence measures.

pub mod diagnostics;
mod lstsq;
pub mod ols;
pub mod result;

#[cfg(test)]
mod tests;

// Re-exports
pub use diagnostics::{DiagnosticResults, Diagnostics};
pub use ols::LinearRegression;
pub use result::OlsModel;

use serde::{Deserialize, Serialize};

/// Linear model configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    /// Confidence level for coefficient intervals
    pub confidence_level: f64,
    /// QR pivot of a unit-norm design column below which it counts as collinear
    pub rank_tolerance: f64,
    /// What to do with rows that have a missing target or predictor
    pub missing: MissingPolicy,
}

/// Handling of `NaN` cells in the training data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Drop incomplete rows (listwise deletion)
    #[default]
    Drop,
    /// Fail with `MissingData`
    Raise,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            rank_tolerance: 1e-10,
            missing: MissingPolicy::Drop,
        }
    }
}
