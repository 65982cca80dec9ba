//! Batch pipeline
//!
//! load -> align -> join -> derive -> {group/correlate, fit -> report}

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use tracing::{info, warn};

use sm_core::data::{DataFrame, Schema};
use sm_core::io::CsvLoader;
use sm_core::join::inner_join;
use sm_core::stats::{CorrelationMatrix, GroupKey, correlation_matrix, group_mean};
use sm_core::time;
use sm_models::{DiagnosticResults, Diagnostics, LinearRegression, ModelReport, ModelSummary, OlsModel};

use crate::config::{IndicatorSource, ModelSpec, PipelineConfig};

/// Name of the aligned monthly key shared by every table
pub const DATE_COLUMN: &str = "date";

/// Boolean column marking rows on or after the cutoff date
pub const CUTOFF_FLAG: &str = "post_cutoff";

/// Everything produced for one configured model
#[derive(Debug, Clone)]
pub struct ModelOutput {
    pub name: String,
    pub model: OlsModel,
    pub summary: ModelSummary,
    pub report: ModelReport,
    pub diagnostics: DiagnosticResults,
}

/// Result of a full run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Joined, filtered dataset with derived columns and the cutoff flag
    pub dataset: DataFrame,
    pub models: Vec<ModelOutput>,
}

impl PipelineOutput {
    pub fn model(&self, name: &str) -> Option<&ModelOutput> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Write `<name>_report.csv` and `<name>_summary.txt` per model
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let mut written = Vec::with_capacity(self.models.len() * 2);
        for output in &self.models {
            let report_path = dir.join(format!("{}_report.csv", output.name));
            output
                .report
                .write_csv(&report_path)
                .with_context(|| format!("Failed to write report for model '{}'", output.name))?;

            let summary_path = dir.join(format!("{}_summary.txt", output.name));
            let text = format!("{}\n{}", output.summary, output.diagnostics);
            fs::write(&summary_path, text)
                .with_context(|| format!("Failed to write {}", summary_path.display()))?;

            written.push(report_path);
            written.push(summary_path);
        }
        Ok(written)
    }
}

/// Dataset overview printed by `inspect`
#[derive(Debug, Clone)]
pub struct Inspection {
    pub rows: usize,
    pub schema: Schema,
    /// Mean of each model target before/after the cutoff
    pub group_means: IndexMap<String, IndexMap<GroupKey, f64>>,
    pub correlations: Option<CorrelationMatrix>,
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Joined dataset: {} rows", self.rows)?;
        writeln!(f, "{}", self.schema)?;

        writeln!(f, "Group means by {}:", CUTOFF_FLAG)?;
        for (column, means) in &self.group_means {
            write!(f, "  {:<20}", column)?;
            for (key, mean) in means {
                write!(f, "  {}={:.3}", key, mean)?;
            }
            writeln!(f)?;
        }

        if let Some(corr) = &self.correlations {
            writeln!(f)?;
            writeln!(f, "Correlations:")?;
            write!(f, "{}", corr)?;
        }
        Ok(())
    }
}

/// Stages of the batch computation, driven by a [`PipelineConfig`]
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Survey table with its mid-month date key
    pub fn load_survey(&self) -> Result<DataFrame> {
        let survey = &self.config.survey;
        let raw = CsvLoader::new()
            .naming(survey.naming.clone())
            .require(survey.year_column.clone())
            .require(survey.month_column.clone())
            .load(&survey.path)
            .with_context(|| format!("Failed to load survey: {}", survey.path.display()))?;

        let aligned = time::with_date_from_parts(&raw, &survey.year_column, &survey.month_column, DATE_COLUMN)
            .with_context(|| format!("Failed to align survey dates in {}", survey.path.display()))?;
        time::ensure_unique_key(&aligned, DATE_COLUMN)?;
        Ok(aligned)
    }

    /// Indicator table with its observation date shifted onto the key
    pub fn load_indicator(&self, source: &IndicatorSource) -> Result<DataFrame> {
        let raw = CsvLoader::new()
            .naming(source.naming())
            .date_column(source.date_column.clone())
            .require(source.date_column.clone())
            .load(&source.path)
            .with_context(|| format!("Failed to load indicator: {}", source.path.display()))?;

        let shifted = time::with_shifted_date(&raw, &source.date_column, self.config.date_shift_days, DATE_COLUMN)
            .with_context(|| format!("Failed to align indicator dates in {}", source.path.display()))?;
        let shifted = if source.date_column == DATE_COLUMN {
            shifted
        } else {
            shifted.drop(&[source.date_column.as_str()])?
        };
        time::ensure_unique_key(&shifted, DATE_COLUMN)
            .with_context(|| format!("Indicator {} repeats a month", source.path.display()))?;
        Ok(shifted)
    }

    /// Load, align and join every table, then add derived columns and the
    /// cutoff flag.
    pub fn dataset(&self) -> Result<DataFrame> {
        let mut tables = vec![self.load_survey()?];
        for source in &self.config.indicators {
            tables.push(self.load_indicator(source)?);
        }

        let joined = inner_join(&tables, DATE_COLUMN).context("Failed to join survey and indicators")?;
        let mut data = time::filter_from(&joined, DATE_COLUMN, self.config.start_date)?;
        for derived in &self.config.derived {
            data = derived
                .apply(&data)
                .with_context(|| format!("Failed to derive column '{}'", derived.name()))?;
        }
        let data = time::with_cutoff_flag(&data, DATE_COLUMN, self.config.cutoff_date, CUTOFF_FLAG)?;

        info!(
            rows = data.nrows(),
            columns = data.ncols(),
            tables = tables.len(),
            "built joined dataset"
        );
        if data.nrows() == 0 {
            warn!("joined dataset is empty; check date ranges and shift");
        }
        Ok(data)
    }

    fn fit_one(&self, spec: &ModelSpec, data: &DataFrame) -> Result<ModelOutput> {
        let train = match spec.train_before {
            Some(end) => time::filter_before(data, DATE_COLUMN, end)?,
            None => data.clone(),
        };

        let model = LinearRegression::new(spec.target.clone())
            .predictors(spec.predictors.iter().cloned())
            .key(DATE_COLUMN)
            .config(self.config.regression)
            .fit(&train)
            .with_context(|| format!("Failed to fit model '{}'", spec.name))?;

        let report = ModelReport::build(&model, data, DATE_COLUMN)
            .with_context(|| format!("Failed to build report for model '{}'", spec.name))?;

        Ok(ModelOutput {
            name: spec.name.clone(),
            summary: model.summary(&spec.name),
            diagnostics: Diagnostics::run_all(&model),
            report,
            model,
        })
    }

    /// Fit every configured model on its own scoped thread
    pub fn fit_models(&self, data: &DataFrame) -> Result<Vec<ModelOutput>> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .config
                .models
                .iter()
                .map(|spec| (spec, scope.spawn(move || self.fit_one(spec, data))))
                .collect();

            handles
                .into_iter()
                .map(|(spec, handle)| {
                    handle
                        .join()
                        .map_err(|_| anyhow!("fitting model '{}' panicked", spec.name))?
                })
                .collect()
        })
    }

    /// Full run: dataset, models, reports
    pub fn run(&self) -> Result<PipelineOutput> {
        let dataset = self.dataset()?;
        let models = self.fit_models(&dataset)?;
        info!(models = models.len(), "pipeline finished");
        Ok(PipelineOutput { dataset, models })
    }

    /// Schema, pre/post means of model targets, and correlations among the
    /// columns the models use.
    pub fn inspect(&self) -> Result<Inspection> {
        let data = self.dataset()?;

        let mut columns: Vec<&str> = Vec::new();
        for spec in &self.config.models {
            for name in std::iter::once(&spec.target).chain(&spec.predictors) {
                if !columns.contains(&name.as_str()) {
                    columns.push(name);
                }
            }
        }

        let mut group_means = IndexMap::new();
        for spec in &self.config.models {
            if group_means.contains_key(&spec.target) {
                continue;
            }
            let means = group_mean(&data, CUTOFF_FLAG, &spec.target)
                .with_context(|| format!("Failed to group '{}' by cutoff", spec.target))?;
            group_means.insert(spec.target.clone(), means);
        }

        let correlations = if columns.len() > 1 {
            Some(correlation_matrix(&data, &columns).context("Failed to correlate model columns")?)
        } else {
            None
        };

        Ok(Inspection {
            rows: data.nrows(),
            schema: data.schema(),
            group_means,
            correlations,
        })
    }
}
