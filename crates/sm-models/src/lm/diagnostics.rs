//! Linear model diagnostics
//!
//! This module provides diagnostic tools for linear regression models,
//! including residual analysis, influence measures, and assumption checks.

use std::fmt;

use chrono::NaiveDate;
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;

use crate::lm::lstsq::LeastSquares;
use crate::lm::result::OlsModel;

/// Diagnostic results
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticResults {
    /// Variance Inflation Factors
    pub vif: Vec<VIF>,
    /// Durbin-Watson statistic
    pub durbin_watson: DurbinWatson,
    /// Cook's distance outliers
    pub cooks_outliers: Vec<CookOutlier>,
    /// High leverage points
    pub high_leverage: Vec<LeveragePoint>,
}

/// Variance Inflation Factor
#[derive(Debug, Clone, Serialize)]
pub struct VIF {
    pub variable: String,
    pub vif: f64,
    pub tolerance: f64,
}

/// Durbin-Watson test
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DurbinWatson {
    pub statistic: f64,
    /// Lag-1 residual autocorrelation implied by the statistic
    pub autocorrelation: f64,
}

/// Cook's distance outlier
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CookOutlier {
    /// Position in the frame the model was fitted on
    pub row: usize,
    pub date: Option<NaiveDate>,
    pub distance: f64,
    pub threshold: f64,
}

/// High leverage point
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LeveragePoint {
    /// Position in the frame the model was fitted on
    pub row: usize,
    pub date: Option<NaiveDate>,
    pub leverage: f64,
    pub threshold: f64,
}

/// Diagnostic analyzer
pub struct Diagnostics;

impl Diagnostics {
    /// Variance inflation factor of each predictor column of `design`
    /// (`design` column 0 is the intercept).
    ///
    /// Each predictor is regressed on the others plus an intercept;
    /// `VIF = 1 / (1 - R²)`.
    pub fn vif(design: &Array2<f64>, variable_names: &[String]) -> Vec<VIF> {
        let p = design.ncols().saturating_sub(1);

        (0..p)
            .map(|j| {
                let target = design.column(j + 1).to_owned();
                let others: Vec<usize> = (0..design.ncols()).filter(|&c| c != j + 1).collect();
                let x = design.select(Axis(1), &others);

                let r_squared = auxiliary_r_squared(&x, &target);
                let vif = 1.0 / (1.0 - r_squared);

                VIF {
                    variable: variable_names
                        .get(j)
                        .cloned()
                        .unwrap_or_else(|| format!("x{}", j)),
                    vif,
                    tolerance: 1.0 / vif,
                }
            })
            .collect()
    }

    /// Calculate Durbin-Watson statistic
    pub fn durbin_watson(residuals: &Array1<f64>) -> DurbinWatson {
        let sum_sq_diff: f64 = residuals
            .windows(2)
            .into_iter()
            .map(|w| (w[1] - w[0]).powi(2))
            .sum();
        let sum_sq = residuals.dot(residuals);

        let dw = if sum_sq > 0.0 {
            sum_sq_diff / sum_sq
        } else {
            f64::NAN
        };

        DurbinWatson {
            statistic: dw,
            autocorrelation: 1.0 - dw / 2.0,
        }
    }

    /// Run all diagnostics
    pub fn run_all(model: &OlsModel) -> DiagnosticResults {
        let keys = model.training_keys.as_deref();
        let locate = |i: usize| (model.training_rows[i], keys.map(|k| k[i]));

        DiagnosticResults {
            vif: Self::vif(&model.design, &model.predictors),
            durbin_watson: Self::durbin_watson(&model.residuals),
            cooks_outliers: Self::cooks_outliers(&model.cooks_distance, locate),
            high_leverage: Self::high_leverage(&model.leverage, model.params.len(), locate),
        }
    }

    fn cooks_outliers<F>(cooks: &Array1<f64>, locate: F) -> Vec<CookOutlier>
    where
        F: Fn(usize) -> (usize, Option<NaiveDate>),
    {
        let threshold = 4.0 / cooks.len() as f64;
        cooks
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > threshold)
            .map(|(i, &d)| {
                let (row, date) = locate(i);
                CookOutlier {
                    row,
                    date,
                    distance: d,
                    threshold,
                }
            })
            .collect()
    }

    fn high_leverage<F>(hat_diag: &Array1<f64>, n_params: usize, locate: F) -> Vec<LeveragePoint>
    where
        F: Fn(usize) -> (usize, Option<NaiveDate>),
    {
        let threshold = 2.0 * n_params as f64 / hat_diag.len() as f64;
        hat_diag
            .iter()
            .enumerate()
            .filter(|(_, h)| **h > threshold)
            .map(|(i, &h)| {
                let (row, date) = locate(i);
                LeveragePoint {
                    row,
                    date,
                    leverage: h,
                    threshold,
                }
            })
            .collect()
    }
}

/// R² of regressing `y` on `x` (which already holds an intercept column)
fn auxiliary_r_squared(x: &Array2<f64>, y: &Array1<f64>) -> f64 {
    let Ok(beta) = LeastSquares::new(x).and_then(|ls| ls.solve(y)) else {
        return f64::NAN;
    };
    let residuals = y - &x.dot(&beta);
    let rss = residuals.dot(&residuals);
    let mean = y.mean().unwrap_or(f64::NAN);
    let tss: f64 = y.iter().map(|&v| (v - mean).powi(2)).sum();
    if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN }
}

impl fmt::Display for DiagnosticResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Variance inflation factors:")?;
        for v in &self.vif {
            writeln!(f, "  {:<20} {:>10.3}", v.variable, v.vif)?;
        }
        writeln!(
            f,
            "Durbin-Watson: {:.4} (lag-1 autocorrelation {:.4})",
            self.durbin_watson.statistic, self.durbin_watson.autocorrelation
        )?;
        writeln!(f, "Cook's distance outliers: {}", self.cooks_outliers.len())?;
        for o in &self.cooks_outliers {
            match o.date {
                Some(date) => writeln!(f, "  {} (row {}): {:.4}", date, o.row, o.distance)?,
                None => writeln!(f, "  row {}: {:.4}", o.row, o.distance)?,
            }
        }
        writeln!(f, "High leverage points: {}", self.high_leverage.len())?;
        Ok(())
    }
}
