//! DataFrame implementation for tabular data
//!
//! A DataFrame is a 2-dimensional labeled data structure with columns of
//! potentially different types, stored column-major in schema order.

use super::*;

use chrono::NaiveDate;
use indexmap::IndexMap;

/// Main DataFrame structure
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataFrame {
    pub(crate) columns: IndexMap<String, Series>,
    pub(crate) nrows: usize,
}

impl DataFrame {
    /// Create an empty DataFrame
    pub fn new() -> Self {
        Self::default()
    }

    /// Create DataFrame from columns
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Series)>,
        S: Into<String>,
    {
        let mut builder = DataFrameBuilder::new();

        for (name, series) in columns.into_iter() {
            builder = builder.with_column(name, series)?;
        }

        builder.build()
    }

    /// Get the shape of the DataFrame (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.columns.len())
    }

    /// Get the number of rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Get the number of columns
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|k| k.as_str()).collect()
    }

    /// The ordered, typed column definitions
    pub fn schema(&self) -> Schema {
        Schema {
            fields: self
                .columns
                .iter()
                .map(|(name, series)| Field {
                    name: name.clone(),
                    dtype: series.column_type(),
                })
                .collect(),
        }
    }

    /// Resolve column names to positions, failing on the first unknown name
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.columns
                    .get_index_of(name)
                    .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
            })
            .collect()
    }

    /// Get a column, failing with `ColumnNotFound`
    pub fn column(&self, name: &str) -> Result<&Series> {
        self.columns
            .get(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// Check if column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Numeric column widened to f64
    pub fn float_column(&self, name: &str) -> Result<FloatArray> {
        let series = self.column(name)?;
        series.to_float().ok_or_else(|| DataError::TypeMismatch {
            column: name.to_string(),
            expected: "numeric",
            actual: series.dtype(),
        })
    }

    /// Date column values
    pub fn date_column(&self, name: &str) -> Result<&[NaiveDate]> {
        let series = self.column(name)?;
        series.as_dates().ok_or_else(|| DataError::TypeMismatch {
            column: name.to_string(),
            expected: "date",
            actual: series.dtype(),
        })
    }

    /// Select specific columns
    pub fn select<I, S>(&self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = DataFrameBuilder::new();

        for name in names.into_iter() {
            let name = name.as_ref();
            builder = builder.with_column(name, self.column(name)?.clone())?;
        }

        let mut df = builder.build()?;
        df.nrows = self.nrows;
        Ok(df)
    }

    /// Filter rows with a boolean mask
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.nrows {
            return Err(DataError::LengthMismatch {
                column: "<mask>".to_string(),
                expected: self.nrows,
                actual: mask.len(),
            });
        }

        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        self.take(&indices)
    }

    /// Filter rows with a predicate
    pub fn filter_with<F>(&self, predicate: F) -> Result<Self>
    where
        F: Fn(&Row) -> bool,
    {
        let mask: Vec<bool> = self.rows().map(|row| predicate(&row)).collect();
        self.filter(&mask)
    }

    /// Gather rows by position, in the order given
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        let mut columns = IndexMap::with_capacity(self.columns.len());
        for (name, series) in &self.columns {
            columns.insert(name.clone(), series.take(indices)?);
        }

        Ok(Self {
            columns,
            nrows: indices.len(),
        })
    }

    /// Add a new column
    pub fn with_column<S: Into<String>>(mut self, name: S, series: Series) -> Result<Self> {
        let name = name.into();

        if self.columns.contains_key(&name) {
            return Err(DataError::DuplicateColumn(name));
        }

        if !self.columns.is_empty() && series.len() != self.nrows {
            return Err(DataError::LengthMismatch {
                column: name,
                expected: self.nrows,
                actual: series.len(),
            });
        }

        if self.columns.is_empty() {
            self.nrows = series.len();
        }

        self.columns.insert(name, series);
        Ok(self)
    }

    /// Rename columns
    pub fn rename<S1, S2>(mut self, mapping: &[(S1, S2)]) -> Result<Self>
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        for (old_name, new_name) in mapping {
            let old_name = old_name.as_ref();
            let new_name = new_name.as_ref();

            if old_name == new_name {
                continue;
            }
            if self.columns.contains_key(new_name) {
                return Err(DataError::DuplicateColumn(new_name.to_string()));
            }

            let idx = self
                .columns
                .get_index_of(old_name)
                .ok_or_else(|| DataError::ColumnNotFound(old_name.to_string()))?;
            // Keep the column in place rather than moving it to the end.
            let (_, series) = self
                .columns
                .shift_remove_index(idx)
                .ok_or_else(|| DataError::ColumnNotFound(old_name.to_string()))?;
            self.columns.shift_insert(idx, new_name.to_string(), series);
        }

        Ok(self)
    }

    /// Drop columns
    pub fn drop<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        for name in names {
            let name = name.as_ref();
            if self.columns.shift_remove(name).is_none() {
                return Err(DataError::ColumnNotFound(name.to_string()));
            }
        }

        if self.columns.is_empty() {
            self.nrows = 0;
        }

        Ok(self)
    }

    /// Iterate over rows
    pub fn rows(&self) -> RowIter<'_> {
        RowIter {
            df: self,
            current: 0,
        }
    }

    /// Stack the named numeric columns into an `nrows × k` matrix
    pub fn numeric_matrix<S: AsRef<str>>(&self, names: &[S]) -> Result<Matrix> {
        let mut matrix = Matrix::zeros((self.nrows, names.len()));
        for (j, name) in names.iter().enumerate() {
            let values = self.float_column(name.as_ref())?;
            matrix.column_mut(j).assign(&values);
        }
        Ok(matrix)
    }
}

/// Row view into a DataFrame
pub struct Row<'a> {
    df: &'a DataFrame,
    row_idx: usize,
}

impl<'a> Row<'a> {
    /// Get a value from the row
    pub fn get(&self, col: &str) -> Result<Option<SeriesValue>> {
        Ok(self.df.column(col)?.get(self.row_idx))
    }

    /// Get value as float
    pub fn get_float(&self, col: &str) -> Result<Option<f64>> {
        Ok(self.get(col)?.and_then(|v| v.as_f64()))
    }
}

/// Iterator over rows
pub struct RowIter<'a> {
    df: &'a DataFrame,
    current: usize,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current < self.df.nrows {
            let row = Row {
                df: self.df,
                row_idx: self.current,
            };
            self.current += 1;
            Some(row)
        } else {
            None
        }
    }
}

const DISPLAY_ROWS: usize = 10;

impl std::fmt::Display for DataFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DataFrame({} rows × {} cols)", self.nrows, self.ncols())?;
        for name in self.columns.keys() {
            write!(f, "{:>14}", truncate(name, 13))?;
        }
        writeln!(f)?;

        for i in 0..self.nrows.min(DISPLAY_ROWS) {
            for series in self.columns.values() {
                let cell = match series.get(i) {
                    Some(SeriesValue::Float(v)) => format!("{:.4}", v),
                    Some(value) => value.to_string(),
                    None => String::new(),
                };
                write!(f, "{:>14}", truncate(&cell, 13))?;
            }
            writeln!(f)?;
        }

        if self.nrows > DISPLAY_ROWS {
            writeln!(f, "... {} more rows", self.nrows - DISPLAY_ROWS)?;
        }
        Ok(())
    }
}

fn truncate(s: &str, width: usize) -> &str {
    match s.char_indices().nth(width) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
