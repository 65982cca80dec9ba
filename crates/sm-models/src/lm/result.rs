//! Fitted OLS model
//!
//! An [`OlsModel`] is built once by `LinearRegression::fit` (or `fit_arrays`)
//! and never mutated; it owns everything needed for prediction, summaries and
//! diagnostics.

use chrono::NaiveDate;
use serde::Serialize;

use crate::base::{
    Coefficient, FittedModel, ModelError, ModelStatistics, ModelSummary, ResidualStatistics, Result,
};
use crate::lm::LinearConfig;
use crate::lm::ols::{Matrix, Vector, linear_predictor};
use sm_core::data::DataFrame;

/// OLS linear regression result
#[derive(Debug, Clone, Serialize)]
pub struct OlsModel {
    pub(crate) target: String,
    pub(crate) predictors: Vec<String>,
    pub(crate) coefficients: Vec<Coefficient>,
    /// Estimates, intercept first
    pub(crate) params: Vector,
    pub(crate) standard_errors: Vector,
    /// Target values of the training rows
    pub(crate) actual: Vector,
    pub(crate) fitted_values: Vector,
    pub(crate) residuals: Vector,
    /// Hat matrix diagonal
    pub(crate) leverage: Vector,
    pub(crate) cooks_distance: Vector,
    /// Design matrix `[1 | X]` of the training rows
    #[serde(skip)]
    pub(crate) design: Matrix,
    pub(crate) training_rows: Vec<usize>,
    pub(crate) training_keys: Option<Vec<NaiveDate>>,
    pub(crate) statistics: ModelStatistics,
    pub(crate) dropped_rows: usize,
    pub(crate) config: LinearConfig,
}

impl OlsModel {
    /// Coefficient estimates, intercept first
    pub fn params(&self) -> &Vector {
        &self.params
    }

    pub fn standard_errors(&self) -> &Vector {
        &self.standard_errors
    }

    /// Target values the model was trained on
    pub fn actual(&self) -> &Vector {
        &self.actual
    }

    /// Hat values of the training rows
    pub fn leverage(&self) -> &Vector {
        &self.leverage
    }

    /// Cook's distance of each training row
    pub fn cooks_distance(&self) -> &Vector {
        &self.cooks_distance
    }

    /// Rows dropped for missing values before fitting
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn config(&self) -> &LinearConfig {
        &self.config
    }

    /// Residual sum of squares
    pub fn rss(&self) -> f64 {
        self.residuals.dot(&self.residuals)
    }

    /// Predict a single observation.
    ///
    /// `row` must name exactly the trained predictors, in training order.
    pub fn predict(&self, row: &[(&str, f64)]) -> Result<f64> {
        let matches = row.len() == self.predictors.len()
            && row
                .iter()
                .zip(&self.predictors)
                .all(|((name, _), expected)| *name == expected.as_str());
        if !matches {
            return Err(ModelError::SchemaMismatch {
                expected: self.predictors.clone(),
                actual: row.iter().map(|(name, _)| name.to_string()).collect(),
            });
        }

        Ok(linear_predictor(&self.params, row.iter().map(|&(_, v)| v)))
    }

    /// Predict every row of `data`, looking predictors up by name.
    ///
    /// Rows with a missing predictor predict `NaN`.
    pub fn predict_frame(&self, data: &DataFrame) -> Result<Vector> {
        if let Some(missing) = self.predictors.iter().find(|p| !data.has_column(p)) {
            tracing::debug!(column = %missing, "prediction frame lacks a trained predictor");
            return Err(ModelError::SchemaMismatch {
                expected: self.predictors.clone(),
                actual: data.column_names().iter().map(|s| s.to_string()).collect(),
            });
        }

        let columns = self
            .predictors
            .iter()
            .map(|name| data.float_column(name))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((0..data.nrows())
            .map(|i| linear_predictor(&self.params, columns.iter().map(|col| col[i])))
            .collect())
    }

    /// Coefficient table and statistics under a display name
    pub fn summary(&self, name: &str) -> ModelSummary {
        ModelSummary {
            name: name.to_string(),
            target: self.target.clone(),
            predictors: self.predictors.clone(),
            coefficients: self.coefficients.clone(),
            model_statistics: self.statistics,
            residual_statistics: ResidualStatistics::from_residuals(&self.residuals),
            dropped_rows: self.dropped_rows,
        }
    }
}

impl FittedModel for OlsModel {
    fn target(&self) -> &str {
        &self.target
    }

    fn predictors(&self) -> &[String] {
        &self.predictors
    }

    fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    fn fitted_values(&self) -> &Vector {
        &self.fitted_values
    }

    fn residuals(&self) -> &Vector {
        &self.residuals
    }

    fn training_rows(&self) -> &[usize] {
        &self.training_rows
    }

    fn training_keys(&self) -> Option<&[NaiveDate]> {
        self.training_keys.as_deref()
    }

    fn statistics(&self) -> &ModelStatistics {
        &self.statistics
    }

    fn predict_frame(&self, data: &DataFrame) -> Result<Vector> {
        OlsModel::predict_frame(self, data)
    }

    fn summary(&self, name: &str) -> ModelSummary {
        OlsModel::summary(self, name)
    }
}
