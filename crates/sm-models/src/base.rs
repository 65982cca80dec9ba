//! Core traits and types for statistical models
//!
//! A fitted model is an immutable value. Everything downstream of fitting
//! (reports, diagnostics, the pipeline) talks to it through [`FittedModel`].

use chrono::NaiveDate;
use ndarray::Array1;

use sm_core::data::DataFrame;

// Re-export core types
pub use coefficient::{Coefficient, INTERCEPT, significance_code};
pub use statistics::{ModelStatistics, ResidualStatistics};
pub use summary::ModelSummary;

pub use crate::error::ModelError;

pub mod coefficient;
pub mod statistics;
pub mod summary;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Read-only view of a model after fitting
pub trait FittedModel: Send + Sync {
    /// Target column name
    fn target(&self) -> &str;

    /// Predictor names, in coefficient order
    fn predictors(&self) -> &[String];

    /// Coefficient table, intercept first
    fn coefficients(&self) -> &[Coefficient];

    /// Fitted values for the training rows
    fn fitted_values(&self) -> &Array1<f64>;

    /// Residuals (actual - fitted) for the training rows
    fn residuals(&self) -> &Array1<f64>;

    /// Positions of the training rows in the frame passed to `fit`
    fn training_rows(&self) -> &[usize];

    /// Dates of the training rows, when the model was fitted with a date key
    fn training_keys(&self) -> Option<&[NaiveDate]>;

    /// Goodness-of-fit statistics
    fn statistics(&self) -> &ModelStatistics;

    /// Predict every row of `data`
    fn predict_frame(&self, data: &DataFrame) -> Result<Array1<f64>>;

    /// Coefficient table and statistics under a display name
    fn summary(&self, name: &str) -> ModelSummary;
}
