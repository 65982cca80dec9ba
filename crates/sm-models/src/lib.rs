//! Regression models for sentiment/macro analysis
//!
//! [`LinearRegression`] fits an OLS model with an intercept; the resulting
//! [`OlsModel`] predicts, summarizes itself and feeds [`ModelReport`] and
//! [`Diagnostics`].

pub mod base;
pub mod error;
pub mod lm;
pub mod report;

pub use base::{Coefficient, FittedModel, ModelStatistics, ModelSummary, Result};
pub use error::ModelError;
pub use lm::ols::fit_arrays;
pub use lm::{DiagnosticResults, Diagnostics, LinearConfig, LinearRegression, MissingPolicy, OlsModel};
pub use report::{ModelReport, ReportRow};
