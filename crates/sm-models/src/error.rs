//! Model-related error types

use thiserror::Error;

use sm_core::data::DataError;

/// Model-related errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// Data-related error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Too few complete rows for the number of parameters
    #[error("Not enough data: {n_samples} samples for {n_params} parameters")]
    InsufficientData {
        /// Number of usable rows
        n_samples: usize,
        /// Number of estimated parameters, intercept included
        n_params: usize,
    },

    /// Design matrix is rank deficient
    #[error("Predictor '{column}' is collinear with the preceding columns")]
    CollinearPredictors {
        /// First column found to be linearly dependent
        column: String,
    },

    /// Prediction input does not match the trained predictors
    #[error("Predictor mismatch: expected [{}], got [{}]", expected.join(", "), actual.join(", "))]
    SchemaMismatch {
        /// Trained predictor names, in order
        expected: Vec<String>,
        /// Names supplied by the caller
        actual: Vec<String>,
    },

    /// Numerical computation error
    #[error("Numerical error: {message} (operation: {operation})")]
    NumericalError {
        /// Error message
        message: String,
        /// Operation that failed
        operation: String,
    },

    /// Invalid model configuration
    #[error("Invalid model configuration: {message}")]
    InvalidConfig {
        /// Configuration error message
        message: String,
    },
}
