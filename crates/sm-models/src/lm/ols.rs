//! Ordinary Least Squares (OLS) linear regression
//!
//! This module implements the standard linear regression model
//! using the ordinary least squares estimator.

use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use tracing::{debug, info};

use crate::base::{Coefficient, INTERCEPT, ModelError, ModelStatistics, Result};
use crate::lm::lstsq::LeastSquares;
use crate::lm::result::OlsModel;
use crate::lm::{LinearConfig, MissingPolicy};
use sm_core::data::{DataError, DataFrame};

/// Matrix type alias for 2D arrays
pub type Matrix = Array2<f64>;

/// Vector type alias for 1D arrays
pub type Vector = Array1<f64>;

/// OLS model specification; `fit` turns it into an [`OlsModel`]
#[derive(Debug, Clone)]
pub struct LinearRegression {
    target: String,
    predictors: Vec<String>,
    key: Option<String>,
    config: LinearConfig,
}

impl LinearRegression {
    /// Regress `target` on nothing yet (an intercept-only model)
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            predictors: Vec::new(),
            key: None,
            config: LinearConfig::default(),
        }
    }

    /// Set the predictor columns, in coefficient order
    pub fn predictors<I, S>(mut self, predictors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.predictors = predictors.into_iter().map(Into::into).collect();
        self
    }

    /// Record the dates of the training rows from this date column
    pub fn key(mut self, date_col: impl Into<String>) -> Self {
        self.key = Some(date_col.into());
        self
    }

    /// Set configuration
    pub fn config(mut self, config: LinearConfig) -> Self {
        self.config = config;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Fit the model on the named columns of `data`
    pub fn fit(&self, data: &DataFrame) -> Result<OlsModel> {
        let y = data.float_column(&self.target)?;
        let columns = self
            .predictors
            .iter()
            .map(|name| Ok((name.as_str(), data.float_column(name)?)))
            .collect::<Result<Vec<_>>>()?;
        let keys = match &self.key {
            Some(col) => Some(data.date_column(col)?),
            None => None,
        };

        fit_design(&self.target, &y, &columns, keys, &self.config)
    }
}

/// Fit `target ~ predictors` from raw arrays.
///
/// Row positions in the returned model refer to positions in `y`.
pub fn fit_arrays(
    target: &str,
    y: &Vector,
    predictors: &[(&str, Vector)],
    config: &LinearConfig,
) -> Result<OlsModel> {
    fit_design(target, y, predictors, None, config)
}

fn validate_config(config: &LinearConfig) -> Result<()> {
    if !(config.confidence_level > 0.0 && config.confidence_level < 1.0) {
        return Err(ModelError::InvalidConfig {
            message: format!(
                "confidence_level must lie in (0, 1), got {}",
                config.confidence_level
            ),
        });
    }
    if !(config.rank_tolerance >= 0.0 && config.rank_tolerance < 1.0) {
        return Err(ModelError::InvalidConfig {
            message: format!(
                "rank_tolerance must lie in [0, 1), got {}",
                config.rank_tolerance
            ),
        });
    }
    Ok(())
}

/// Positions of rows with no missing cell in the target or any predictor
fn complete_rows(
    target: &str,
    y: &Vector,
    predictors: &[(&str, Vector)],
    policy: MissingPolicy,
) -> Result<Vec<usize>> {
    let mut rows = Vec::with_capacity(y.len());
    for i in 0..y.len() {
        let missing = if y[i].is_nan() {
            Some(target)
        } else {
            predictors
                .iter()
                .find(|(_, col)| col[i].is_nan())
                .map(|(name, _)| *name)
        };

        match (missing, policy) {
            (None, _) => rows.push(i),
            (Some(column), MissingPolicy::Raise) => {
                return Err(DataError::MissingData(format!("{} (row {})", column, i)).into());
            }
            (Some(_), MissingPolicy::Drop) => {}
        }
    }
    Ok(rows)
}

/// `b0 + Σ b_j x_j`, summed in coefficient order
pub(crate) fn linear_predictor(params: &Vector, values: impl Iterator<Item = f64>) -> f64 {
    params
        .iter()
        .skip(1)
        .zip(values)
        .fold(params[0], |acc, (b, x)| acc + b * x)
}

fn fit_design(
    target: &str,
    y: &Vector,
    predictors: &[(&str, Vector)],
    keys: Option<&[NaiveDate]>,
    config: &LinearConfig,
) -> Result<OlsModel> {
    validate_config(config)?;

    let n_total = y.len();
    for (name, col) in predictors {
        if col.len() != n_total {
            return Err(DataError::LengthMismatch {
                column: name.to_string(),
                expected: n_total,
                actual: col.len(),
            }
            .into());
        }
    }
    if let Some(keys) = keys {
        if keys.len() != n_total {
            return Err(DataError::LengthMismatch {
                column: "key".to_string(),
                expected: n_total,
                actual: keys.len(),
            }
            .into());
        }
    }

    let rows = complete_rows(target, y, predictors, config.missing)?;
    let dropped = n_total - rows.len();
    if dropped > 0 {
        debug!(model = target, dropped, "dropped incomplete rows before fitting");
    }

    let n = rows.len();
    let p = predictors.len();
    let k = p + 1;
    if n <= k {
        return Err(ModelError::InsufficientData {
            n_samples: n,
            n_params: k,
        });
    }

    let names: Vec<String> = std::iter::once(INTERCEPT.to_string())
        .chain(predictors.iter().map(|(name, _)| name.to_string()))
        .collect();

    // Design matrix [1 | X] over the complete rows
    let mut x = Matrix::ones((n, k));
    for (j, (_, col)) in predictors.iter().enumerate() {
        for (i, &row) in rows.iter().enumerate() {
            x[(i, j + 1)] = col[row];
        }
    }
    let y_used: Vector = rows.iter().map(|&row| y[row]).collect();

    let ls = LeastSquares::new(&x)?;
    if let Some(j) = ls.first_deficient_column(config.rank_tolerance) {
        return Err(ModelError::CollinearPredictors {
            column: names[j].clone(),
        });
    }

    let params = ls.solve(&y_used)?;
    let fitted: Vector = x
        .rows()
        .into_iter()
        .map(|row| linear_predictor(&params, row.iter().skip(1).copied()))
        .collect();
    let residuals = &y_used - &fitted;

    let df_residual = n - k;
    let rss = residuals.dot(&residuals);
    let y_mean = y_used.mean().unwrap_or(f64::NAN);
    let tss: f64 = y_used.iter().map(|&v| (v - y_mean).powi(2)).sum();
    let sigma2 = rss / df_residual as f64;
    let residual_std_error = sigma2.sqrt();

    let xtx_inv = ls.xtx_inverse()?;
    let standard_errors = xtx_inv.diag().mapv(|v| (v * sigma2).sqrt());

    let coefficients = inference(&names, &params, &standard_errors, df_residual, config)?;

    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * ((n as f64 - 1.0) / df_residual as f64);
    let (f_statistic, f_p_value) = f_test(rss, tss, p, df_residual)?;

    let log_likelihood = gaussian_log_likelihood(rss, n);
    // Coefficients plus the error variance
    let n_estimated = (k + 1) as f64;
    let aic = 2.0 * n_estimated - 2.0 * log_likelihood;
    let bic = (n as f64).ln() * n_estimated - 2.0 * log_likelihood;

    let leverage = ls.leverage()?;
    let cooks_distance = cooks_distance(&residuals, &leverage, k, sigma2);

    let statistics = ModelStatistics {
        r_squared,
        adj_r_squared,
        residual_std_error,
        f_statistic,
        f_p_value,
        log_likelihood,
        aic,
        bic,
        df_residual,
        df_model: p,
        n_obs: n,
    };

    info!(model = target, n, predictors = p, dropped, r_squared, "fitted OLS model");

    let training_keys = keys.map(|keys| rows.iter().map(|&row| keys[row]).collect());

    Ok(OlsModel {
        target: target.to_string(),
        predictors: names[1..].to_vec(),
        coefficients,
        params,
        standard_errors,
        actual: y_used,
        fitted_values: fitted,
        residuals,
        leverage,
        cooks_distance,
        design: x,
        training_rows: rows,
        training_keys,
        statistics,
        dropped_rows: dropped,
        config: *config,
    })
}

/// t statistics, two-sided p-values and confidence intervals
fn inference(
    names: &[String],
    params: &Vector,
    std_errors: &Vector,
    df: usize,
    config: &LinearConfig,
) -> Result<Vec<Coefficient>> {
    let t_dist = StudentsT::new(0.0, 1.0, df as f64).map_err(|e| ModelError::NumericalError {
        message: format!("Failed to create t-distribution: {}", e),
        operation: "inference".to_string(),
    })?;

    let alpha = 1.0 - config.confidence_level;
    let t_critical = t_dist.inverse_cdf(1.0 - alpha / 2.0);

    Ok(names
        .iter()
        .zip(params.iter().zip(std_errors.iter()))
        .enumerate()
        .map(|(i, (name, (&estimate, &se)))| {
            let t = estimate / se;
            let p = if t.is_nan() {
                f64::NAN
            } else {
                (2.0 * (1.0 - t_dist.cdf(t.abs()))).clamp(0.0, 1.0)
            };
            let coef = Coefficient::new(name.clone(), estimate)
                .with_std_error(se)
                .with_t_stat(t)
                .with_p_value(p)
                .with_ci(estimate - t_critical * se, estimate + t_critical * se);
            if i == 0 { coef.as_intercept() } else { coef }
        })
        .collect())
}

/// Overall F test against the intercept-only model
fn f_test(rss: f64, tss: f64, p: usize, df_residual: usize) -> Result<(Option<f64>, Option<f64>)> {
    if p == 0 {
        return Ok((None, None));
    }

    let df_model = p as f64;
    let df_resid = df_residual as f64;
    let f_statistic = ((tss - rss) / df_model) / (rss / df_resid);

    let f_dist = FisherSnedecor::new(df_model, df_resid).map_err(|e| ModelError::NumericalError {
        message: format!("Failed to create F-distribution: {}", e),
        operation: "f_test".to_string(),
    })?;

    let f_p_value = if f_statistic.is_finite() {
        (1.0 - f_dist.cdf(f_statistic)).clamp(0.0, 1.0)
    } else if f_statistic == f64::INFINITY {
        0.0
    } else {
        f64::NAN
    };

    Ok((Some(f_statistic), Some(f_p_value)))
}

/// Maximized Gaussian log-likelihood with `σ² = RSS / n`
fn gaussian_log_likelihood(rss: f64, n: usize) -> f64 {
    let n = n as f64;
    let sigma2 = rss / n;
    -0.5 * n * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0)
}

fn cooks_distance(residuals: &Vector, leverage: &Vector, k: usize, sigma2: f64) -> Vector {
    residuals
        .iter()
        .zip(leverage.iter())
        .map(|(&r, &h)| (r * r * h) / (k as f64 * sigma2 * (1.0 - h).powi(2)))
        .collect()
}
