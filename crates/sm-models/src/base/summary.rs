//! Model summary structures

use std::fmt;

use serde::{Deserialize, Serialize};

use super::coefficient::Coefficient;
use super::statistics::{ModelStatistics, ResidualStatistics};

/// Coefficient table plus fit statistics, renderable as an R-style report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Name of the model (e.g. the configured model key)
    pub name: String,
    /// Target column
    pub target: String,
    /// Predictor columns, in coefficient order after the intercept
    pub predictors: Vec<String>,
    /// Coefficients table
    pub coefficients: Vec<Coefficient>,
    /// Model statistics
    pub model_statistics: ModelStatistics,
    /// Residual statistics
    pub residual_statistics: ResidualStatistics,
    /// Rows dropped for missing values before fitting
    pub dropped_rows: usize,
}

impl ModelSummary {
    /// `target ~ a + b + c`
    pub fn formula(&self) -> String {
        if self.predictors.is_empty() {
            format!("{} ~ 1", self.target)
        } else {
            format!("{} ~ {}", self.target, self.predictors.join(" + "))
        }
    }

    /// Coefficient by name
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.model_statistics;
        let resid = &self.residual_statistics;

        writeln!(f, "Model: {}", self.name)?;
        writeln!(f, "Formula: {}", self.formula())?;
        writeln!(
            f,
            "Observations: {} ({} dropped for missing values)",
            stats.n_obs, self.dropped_rows
        )?;
        writeln!(f)?;

        writeln!(f, "Residuals:")?;
        writeln!(
            f,
            "{:>12} {:>12} {:>12} {:>12} {:>12}",
            "Min", "1Q", "Median", "3Q", "Max"
        )?;
        writeln!(
            f,
            "{:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            resid.min, resid.q1, resid.median, resid.q3, resid.max
        )?;
        writeln!(f)?;

        writeln!(f, "Coefficients:")?;
        writeln!(
            f,
            "{:<20} {:>12} {:>12} {:>10} {:>10}",
            "Term", "Estimate", "Std. Error", "t value", "Pr(>|t|)"
        )?;
        for coeff in &self.coefficients {
            writeln!(
                f,
                "{:<20} {:>12.6} {:>12.6} {:>10.3} {:>10.4} {}",
                coeff.name,
                coeff.estimate,
                coeff.std_error,
                coeff.t_stat,
                coeff.p_value,
                coeff.significance()
            )?;
        }
        writeln!(f, "---")?;
        writeln!(f, "Signif. codes:  0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1 ' ' 1")?;
        writeln!(f)?;

        writeln!(
            f,
            "Residual standard error: {:.4} on {} degrees of freedom",
            stats.residual_std_error, stats.df_residual
        )?;
        writeln!(
            f,
            "Multiple R-squared: {:.4},\tAdjusted R-squared: {:.4}",
            stats.r_squared, stats.adj_r_squared
        )?;
        if let (Some(f_stat), Some(p)) = (stats.f_statistic, stats.f_p_value) {
            writeln!(
                f,
                "F-statistic: {:.3} on {} and {} DF,  p-value: {:.4e}",
                f_stat, stats.df_model, stats.df_residual, p
            )?;
        }
        writeln!(
            f,
            "Log-likelihood: {:.3}  AIC: {:.3}  BIC: {:.3}",
            stats.log_likelihood, stats.aic, stats.bic
        )?;

        Ok(())
    }
}
