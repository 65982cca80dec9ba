//! Per-row model reports
//!
//! A [`ModelReport`] lines up, for every row of an evaluation frame, the
//! observed target, the model prediction and (for training rows) the fitted
//! value and residual. Plotting and commentary consume these reports.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::base::{FittedModel, Result};
use sm_core::data::{DataError, DataFrame, Series};

/// One evaluated row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportRow {
    pub date: NaiveDate,
    /// Observed target; `NaN` when missing
    pub actual: f64,
    pub predicted: f64,
    /// Present only for rows the model was trained on
    pub fitted: Option<f64>,
    pub residual: Option<f64>,
}

/// Actual vs predicted for every row of an evaluation frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub target: String,
    pub rows: Vec<ReportRow>,
}

impl ModelReport {
    /// Evaluate `model` on every row of `frame`.
    ///
    /// Training rows are matched by date when the model recorded training
    /// dates, otherwise by row position (so `frame` must then be the frame the
    /// model was fitted on).
    pub fn build<M: FittedModel>(model: &M, frame: &DataFrame, date_col: &str) -> Result<Self> {
        let dates = frame.date_column(date_col)?;
        let actual = frame.float_column(model.target())?;
        let predicted = model.predict_frame(frame)?;

        let fitted = model.fitted_values();
        let residuals = model.residuals();
        let training: HashMap<usize, usize> = match model.training_keys() {
            Some(keys) => {
                let by_date: HashMap<NaiveDate, usize> =
                    keys.iter().enumerate().map(|(i, &d)| (d, i)).collect();
                dates
                    .iter()
                    .enumerate()
                    .filter_map(|(row, d)| by_date.get(d).map(|&i| (row, i)))
                    .collect()
            }
            None => model
                .training_rows()
                .iter()
                .enumerate()
                .filter(|(_, row)| **row < frame.nrows())
                .map(|(i, &row)| (row, i))
                .collect(),
        };

        let rows = (0..frame.nrows())
            .map(|row| {
                let train = training.get(&row);
                ReportRow {
                    date: dates[row],
                    actual: actual[row],
                    predicted: predicted[row],
                    fitted: train.map(|&i| fitted[i]),
                    residual: train.map(|&i| residuals[i]),
                }
            })
            .collect();

        Ok(Self {
            target: model.target().to_string(),
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that carry a fitted value
    pub fn training_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.fitted.is_some())
    }

    /// Columns `date, actual, predicted, fitted, residual`; absent fitted
    /// values become `NaN`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let column = |f: fn(&ReportRow) -> f64| Series::float(self.rows.iter().map(f).collect::<Vec<_>>());

        Ok(DataFrame::from_columns(vec![
            ("date", Series::date(self.rows.iter().map(|r| r.date).collect::<Vec<_>>())),
            ("actual", column(|r| r.actual)),
            ("predicted", column(|r| r.predicted)),
            ("fitted", column(|r| r.fitted.unwrap_or(f64::NAN))),
            ("residual", column(|r| r.residual.unwrap_or(f64::NAN))),
        ])?)
    }

    /// Write the report as CSV with a header row; absent values are empty
    /// cells.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let csv_error = |error| DataError::Csv {
            source_name: path.display().to_string(),
            error,
        };

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(csv_error)?;
        for row in &self.rows {
            wtr.serialize(row).map_err(csv_error)?;
        }
        wtr.flush().map_err(DataError::Io)?;

        info!(path = %path.display(), rows = self.rows.len(), "wrote model report");
        Ok(())
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v));

        writeln!(f, "Report for {}", self.target)?;
        writeln!(
            f,
            "{:<12} {:>10} {:>10} {:>10} {:>10}",
            "date", "actual", "predicted", "fitted", "residual"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<12} {:>10.3} {:>10.3} {:>10} {:>10}",
                row.date.to_string(),
                row.actual,
                row.predicted,
                opt(row.fitted),
                opt(row.residual)
            )?;
        }
        Ok(())
    }
}
