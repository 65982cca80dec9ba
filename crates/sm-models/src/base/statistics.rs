//! Statistical structures for model results

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Goodness-of-fit statistics for a fitted model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelStatistics {
    /// R-squared
    pub r_squared: f64,
    /// Adjusted R-squared
    pub adj_r_squared: f64,
    /// Residual standard error
    pub residual_std_error: f64,
    /// F-statistic; `None` for an intercept-only model
    pub f_statistic: Option<f64>,
    /// F-statistic p-value
    pub f_p_value: Option<f64>,
    /// Gaussian log-likelihood
    pub log_likelihood: f64,
    /// AIC
    pub aic: f64,
    /// BIC
    pub bic: f64,
    /// Residual degrees of freedom
    pub df_residual: usize,
    /// Model degrees of freedom (predictors, intercept excluded)
    pub df_model: usize,
    /// Number of observations used in the fit
    pub n_obs: usize,
}

/// Distribution summary of the residuals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualStatistics {
    /// Minimum residual
    pub min: f64,
    /// First quartile
    pub q1: f64,
    /// Median
    pub median: f64,
    /// Third quartile
    pub q3: f64,
    /// Maximum residual
    pub max: f64,
    /// Mean residual
    pub mean: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Skewness
    pub skewness: Option<f64>,
    /// Excess kurtosis
    pub kurtosis: Option<f64>,
}

impl ResidualStatistics {
    /// Summarize a residual vector. Quantiles interpolate linearly between
    /// order statistics.
    pub fn from_residuals(residuals: &Array1<f64>) -> Self {
        let mut sorted = residuals.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mean = residuals.mean().unwrap_or(f64::NAN);
        let std_dev = if residuals.len() > 1 {
            residuals.std(1.0)
        } else {
            f64::NAN
        };

        Self {
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
            mean,
            std_dev,
            skewness: moment_ratio(residuals, mean, std_dev, 3, 3),
            kurtosis: moment_ratio(residuals, mean, std_dev, 4, 4).map(|m| m - 3.0),
        }
    }
}

/// Quantile of already-sorted data
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let idx = (sorted.len() as f64 - 1.0) * q;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = idx - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Central moment of order `k` divided by `std^k`; `None` for too few points
/// or zero spread.
fn moment_ratio(data: &Array1<f64>, mean: f64, std: f64, k: i32, min_n: usize) -> Option<f64> {
    let n = data.len();
    if n < min_n || !(std > 1e-12) {
        return None;
    }
    let sum: f64 = data.iter().map(|&x| (x - mean).powi(k)).sum();
    Some((sum / n as f64) / std.powi(k))
}
