//! Pipeline configuration
//!
//! Read from a TOML file. Relative data paths are resolved against the
//! directory holding the configuration file.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use sm_core::derive::DerivedColumn;
use sm_core::io::ColumnNaming;
use sm_core::time::DEFAULT_SHIFT_DAYS;
use sm_models::LinearConfig;

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2008, 1, 1).unwrap_or_default()
}

fn default_cutoff_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

fn default_shift_days() -> i64 {
    DEFAULT_SHIFT_DAYS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_year_column() -> String {
    "yyyy".to_string()
}

fn default_month_column() -> String {
    "Month".to_string()
}

fn default_observation_column() -> String {
    "observation_date".to_string()
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Rows dated before this are dropped after the join
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    /// Splits the dataset into pre/post periods
    #[serde(default = "default_cutoff_date")]
    pub cutoff_date: NaiveDate,
    /// Days added to indicator observation dates
    #[serde(default = "default_shift_days")]
    pub date_shift_days: i64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub survey: SurveySource,
    #[serde(default)]
    pub indicators: Vec<IndicatorSource>,
    #[serde(default)]
    pub derived: Vec<DerivedColumn>,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
    #[serde(default)]
    pub regression: LinearConfig,
}

/// Monthly survey table with separate year and month fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySource {
    pub path: PathBuf,
    #[serde(default = "default_year_column")]
    pub year_column: String,
    #[serde(default = "default_month_column")]
    pub month_column: String,
    #[serde(default)]
    pub naming: ColumnNaming,
}

/// One indicator series keyed by its observation date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSource {
    pub path: PathBuf,
    #[serde(default = "default_observation_column")]
    pub date_column: String,
    /// Header renames applied on load
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
}

impl IndicatorSource {
    pub fn naming(&self) -> ColumnNaming {
        if self.rename.is_empty() {
            ColumnNaming::Keep
        } else {
            ColumnNaming::Rename(self.rename.clone())
        }
    }
}

/// A regression to fit on the joined dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub predictors: Vec<String>,
    /// Fit only on rows dated before this; all rows are still reported
    #[serde(default)]
    pub train_before: Option<NaiveDate>,
}

impl PipelineConfig {
    /// Parse configuration text without touching the filesystem
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(text).context("Failed to parse pipeline config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolve_paths(base))
    }

    /// Make every relative path relative to `base`
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.survey.path);
        for indicator in &mut self.indicators {
            resolve(&mut indicator.path);
        }
        resolve(&mut self.output_dir);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cutoff_date <= self.start_date {
            bail!(
                "cutoff_date {} must fall after start_date {}",
                self.cutoff_date,
                self.start_date
            );
        }

        let mut names = HashSet::new();
        for model in &self.models {
            if !names.insert(model.name.as_str()) {
                bail!("duplicate model name '{}'", model.name);
            }
            if model.predictors.iter().any(|p| p == &model.target) {
                bail!("model '{}' uses its target '{}' as a predictor", model.name, model.target);
            }
        }

        let mut derived = HashSet::new();
        for column in &self.derived {
            if !derived.insert(column.name()) {
                bail!("derived column '{}' is defined twice", column.name());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [survey]
        path = "survey.csv"

        [[models]]
        name = "ics"
        target = "ics_all"
        predictors = ["UNRATE"]
    "#;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2008, 1, 1).unwrap());
        assert_eq!(config.cutoff_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(config.date_shift_days, 14);
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.survey.year_column, "yyyy");
        assert_eq!(config.survey.month_column, "Month");
        assert_eq!(config.regression, LinearConfig::default());
        assert!(config.indicators.is_empty());
    }

    #[test]
    fn test_full_config() {
        let text = r#"
            start_date = "2010-01-01"
            cutoff_date = "2021-06-01"
            date_shift_days = 10

            [survey]
            path = "data/sca.csv"
            naming = "lowercase"

            [[indicators]]
            path = "data/core.csv"
            rename = { CORESTICKM159SFRBATL = "core_cpi" }

            [[derived]]
            kind = "power"
            name = "DFF_sq"
            column = "DFF"
            exponent = 2.0

            [[derived]]
            kind = "product"
            name = "cpi_x_dff"
            left = "core_cpi"
            right = "DFF"

            [[models]]
            name = "ics"
            target = "ics_all"
            predictors = ["core_cpi", "DFF", "DFF_sq"]
            train_before = "2020-01-01"

            [regression]
            confidence_level = 0.9
            missing = "raise"
        "#;

        let config = PipelineConfig::from_toml_str(text).unwrap();
        assert_eq!(config.date_shift_days, 10);
        assert_eq!(config.survey.naming, ColumnNaming::Lowercase);
        assert_eq!(config.indicators[0].date_column, "observation_date");
        assert!(matches!(config.indicators[0].naming(), ColumnNaming::Rename(m) if m["CORESTICKM159SFRBATL"] == "core_cpi"));
        assert_eq!(config.derived.len(), 2);
        assert_eq!(config.derived[0].name(), "DFF_sq");
        assert_eq!(
            config.models[0].train_before,
            NaiveDate::from_ymd_opt(2020, 1, 1)
        );
        assert_eq!(config.regression.confidence_level, 0.9);
        assert_eq!(config.regression.rank_tolerance, 1e-10);
        assert_eq!(config.regression.missing, sm_models::MissingPolicy::Raise);
    }

    #[test]
    fn test_rejects_inverted_dates() {
        let text = format!("start_date = \"2021-01-01\"\ncutoff_date = \"2020-01-01\"\n{}", MINIMAL);
        assert!(PipelineConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_rejects_duplicate_models() {
        let text = format!(
            "{}\n[[models]]\nname = \"ics\"\ntarget = \"ice_all\"\n",
            MINIMAL
        );
        let err = PipelineConfig::from_toml_str(&text).unwrap_err();
        assert!(format!("{:#}", err).contains("duplicate model name"));
    }

    #[test]
    fn test_resolve_paths() {
        let config = PipelineConfig::from_toml_str(MINIMAL)
            .unwrap()
            .resolve_paths(Path::new("/data/run"));
        assert_eq!(config.survey.path, PathBuf::from("/data/run/survey.csv"));
        assert_eq!(config.output_dir, PathBuf::from("/data/run/reports"));
    }
}
