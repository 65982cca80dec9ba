//! CSV loader
//!
//! Reads a header-first delimited file into a [`DataFrame`], applying a
//! column-naming rule and inferring a type per column.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::{DataError, DataFrame, DataFrameBuilder, Result, Series};
use crate::time::parse_date;

/// How header names are mapped before columns are typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnNaming {
    /// Keep headers as written
    #[default]
    Keep,
    /// Lowercase every header
    Lowercase,
    /// Rename listed headers, keep the rest
    Rename(BTreeMap<String, String>),
}

/// Cell markers treated as missing numeric values
const MISSING_MARKERS: [&str; 4] = ["", ".", "NA", "NaN"];

/// Configurable CSV reader
#[derive(Debug, Clone)]
pub struct CsvLoader {
    delimiter: u8,
    naming: ColumnNaming,
    date_columns: HashSet<String>,
    required: Vec<String>,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self {
            delimiter: b',',
            naming: ColumnNaming::Keep,
            date_columns: HashSet::new(),
            required: Vec::new(),
        }
    }
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the header naming rule
    pub fn naming(mut self, naming: ColumnNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Parse the named column (after renaming) as dates
    pub fn date_column(mut self, name: impl Into<String>) -> Self {
        self.date_columns.insert(name.into());
        self
    }

    /// Require a column (after renaming) to be present
    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Load a file from disk
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let file = std::fs::File::open(path)?;
        let df = self.read(file, &source_name)?;
        info!(
            source = %source_name,
            rows = df.nrows(),
            columns = df.ncols(),
            "loaded table"
        );
        Ok(df)
    }

    /// Load from in-memory text
    pub fn load_str(&self, text: &str) -> Result<DataFrame> {
        self.read(text.as_bytes(), "<memory>")
    }

    fn read<R: Read>(&self, reader: R, source_name: &str) -> Result<DataFrame> {
        let csv_err = |error| DataError::Csv {
            source_name: source_name.to_string(),
            error,
        };

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let raw_headers: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|s| s.to_string())
            .collect();
        let headers = self.apply_naming(&raw_headers, source_name)?;

        for column in &self.required {
            if !headers.contains(column) {
                return Err(DataError::ColumnNotFound(format!(
                    "{} (in {})",
                    column, source_name
                )));
            }
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record.map_err(csv_err)?;
            for (j, column) in cells.iter_mut().enumerate() {
                column.push(record.get(j).unwrap_or("").to_string());
            }
        }

        let mut builder = DataFrameBuilder::new();
        for (name, raw) in headers.iter().zip(cells) {
            let series = if self.date_columns.contains(name) {
                parse_dates(name, &raw, source_name)?
            } else {
                infer_series(raw)
            };
            debug!(column = %name, dtype = series.dtype(), "typed column");
            builder = builder.with_column(name.clone(), series)?;
        }
        builder.build()
    }

    fn apply_naming(&self, headers: &[String], source_name: &str) -> Result<Vec<String>> {
        match &self.naming {
            ColumnNaming::Keep => Ok(headers.to_vec()),
            ColumnNaming::Lowercase => Ok(headers.iter().map(|h| h.to_lowercase()).collect()),
            ColumnNaming::Rename(mapping) => {
                if let Some(missing) = mapping.keys().find(|from| !headers.contains(from)) {
                    return Err(DataError::ColumnNotFound(format!(
                        "{} (in {})",
                        missing, source_name
                    )));
                }
                Ok(headers
                    .iter()
                    .map(|h| mapping.get(h).cloned().unwrap_or_else(|| h.clone()))
                    .collect())
            }
        }
    }
}

fn parse_dates(name: &str, raw: &[String], source_name: &str) -> Result<Series> {
    let dates = raw
        .iter()
        .map(|cell| {
            parse_date(cell).ok_or_else(|| DataError::Parse {
                source_name: source_name.to_string(),
                column: name.to_string(),
                value: cell.clone(),
            })
        })
        .collect::<Result<Vec<NaiveDate>>>()?;
    Ok(Series::date(dates))
}

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

/// Pick the narrowest type every cell fits: int, then float, then string.
fn infer_series(raw: Vec<String>) -> Series {
    if !raw.is_empty() && raw.iter().all(|s| s.parse::<i64>().is_ok()) {
        return Series::int(raw.iter().filter_map(|s| s.parse().ok()).collect::<Vec<i64>>());
    }

    let all_numeric = raw
        .iter()
        .all(|s| is_missing(s.as_str()) || s.parse::<f64>().is_ok());
    let any_value = raw.iter().any(|s| !is_missing(s.as_str()));
    if all_numeric && any_value {
        let values: Vec<f64> = raw
            .iter()
            .map(|s| s.parse::<f64>().unwrap_or(f64::NAN))
            .collect();
        return Series::float(values);
    }

    Series::string(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURVEY: &str = "\
Month,yyyy,ics_all,ice_all,pago_r_all
January,2020,99.8,90.5,
February,2020,101.0,92.1,23
";

    const FRED: &str = "\
observation_date,UNRATE
2020-01-01,3.6
2020-02-01,.
";

    #[test]
    fn test_infers_types() {
        let df = CsvLoader::new().load_str(SURVEY).unwrap();
        assert_eq!(df.shape(), (2, 5));
        assert_eq!(df.column("Month").unwrap().dtype(), "string");
        assert_eq!(df.column("yyyy").unwrap().dtype(), "int64");
        assert_eq!(df.column("ics_all").unwrap().dtype(), "float64");

        let pago = df.float_column("pago_r_all").unwrap();
        assert!(pago[0].is_nan());
        assert_eq!(pago[1], 23.0);
    }

    #[test]
    fn test_date_column_and_missing_marker() {
        let df = CsvLoader::new()
            .date_column("observation_date")
            .load_str(FRED)
            .unwrap();

        let dates = df.date_column("observation_date").unwrap();
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());

        let unrate = df.float_column("UNRATE").unwrap();
        assert_eq!(unrate[0], 3.6);
        assert!(unrate[1].is_nan());
    }

    #[test]
    fn test_rename_rule() {
        let mut mapping = BTreeMap::new();
        mapping.insert("yyyy".to_string(), "year".to_string());
        mapping.insert("Month".to_string(), "month".to_string());

        let df = CsvLoader::new()
            .naming(ColumnNaming::Rename(mapping))
            .require("year")
            .load_str(SURVEY)
            .unwrap();
        assert_eq!(df.column_names()[..2], ["month", "year"]);
    }

    #[test]
    fn test_rename_unknown_source_column() {
        let mut mapping = BTreeMap::new();
        mapping.insert("YYYY".to_string(), "year".to_string());

        let err = CsvLoader::new()
            .naming(ColumnNaming::Rename(mapping))
            .load_str(SURVEY)
            .unwrap_err();
        assert!(matches!(err, DataError::ColumnNotFound(msg) if msg.contains("YYYY")));
    }

    #[test]
    fn test_required_column_missing() {
        let err = CsvLoader::new()
            .naming(ColumnNaming::Lowercase)
            .require("Month")
            .load_str(SURVEY)
            .unwrap_err();
        assert!(matches!(err, DataError::ColumnNotFound(_)));
    }

    #[test]
    fn test_tab_delimited() {
        let text = "observation_date\tUNRATE\n2020-01-01\t3.6\n";
        let df = CsvLoader::new()
            .delimiter(b'\t')
            .date_column("observation_date")
            .load_str(text)
            .unwrap();
        assert_eq!(df.shape(), (1, 2));
        assert_eq!(df.float_column("UNRATE").unwrap()[0], 3.6);
    }

    #[test]
    fn test_bad_date_cell() {
        let text = "observation_date,DFF\nnot-a-date,1.5\n";
        let err = CsvLoader::new()
            .date_column("observation_date")
            .load_str(text)
            .unwrap_err();
        assert!(matches!(err, DataError::Parse { value, .. } if value == "not-a-date"));
    }
}
