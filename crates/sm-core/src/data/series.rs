//! Series data structure for holding homogeneous data
//!
//! A Series is a one-dimensional typed column. Float columns use `NaN` to
//! mark missing cells, the way the upstream CSV files leave blanks.

use super::*;

use chrono::NaiveDate;
use ndarray::Array1;

/// A Series is a typed, one-dimensional array of data
#[derive(Clone, Debug, PartialEq)]
pub enum Series {
    /// Floating point numbers (f64), `NaN` is missing
    Float(FloatArray),
    /// Integer numbers (i64)
    Int(IntArray),
    /// Boolean values
    Bool(BoolArray),
    /// Calendar dates
    Date(DateArray),
    /// String values
    String(StringArray),
}

impl Series {
    /// Create a new Float series
    pub fn float(data: impl Into<FloatArray>) -> Self {
        Series::Float(data.into())
    }

    /// Create a new Int series
    pub fn int(data: impl Into<IntArray>) -> Self {
        Series::Int(data.into())
    }

    /// Create a new Bool series
    pub fn bool(data: impl Into<BoolArray>) -> Self {
        Series::Bool(data.into())
    }

    /// Create a new Date series
    pub fn date(data: impl Into<DateArray>) -> Self {
        Series::Date(data.into())
    }

    /// Create a new String series
    pub fn string(data: impl Into<StringArray>) -> Self {
        Series::String(data.into())
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        match self {
            Series::Float(arr) => arr.len(),
            Series::Int(arr) => arr.len(),
            Series::Bool(arr) => arr.len(),
            Series::Date(arr) => arr.len(),
            Series::String(arr) => arr.len(),
        }
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the column type of the series
    pub fn column_type(&self) -> ColumnType {
        match self {
            Series::Float(_) => ColumnType::Float,
            Series::Int(_) => ColumnType::Int,
            Series::Bool(_) => ColumnType::Bool,
            Series::Date(_) => ColumnType::Date,
            Series::String(_) => ColumnType::String,
        }
    }

    /// Get the type name of the series
    pub fn dtype(&self) -> &'static str {
        self.column_type().name()
    }

    /// Get a value at index
    pub fn get(&self, idx: usize) -> Option<SeriesValue> {
        match self {
            Series::Float(arr) => arr.get(idx).map(|&v| SeriesValue::Float(v)),
            Series::Int(arr) => arr.get(idx).map(|&v| SeriesValue::Int(v)),
            Series::Bool(arr) => arr.get(idx).map(|&v| SeriesValue::Bool(v)),
            Series::Date(arr) => arr.get(idx).map(|&v| SeriesValue::Date(v)),
            Series::String(arr) => arr.get(idx).map(|v| SeriesValue::String(v.clone())),
        }
    }

    /// Filter the series with a boolean mask
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(DataError::LengthMismatch {
                column: "<mask>".to_string(),
                expected: self.len(),
                actual: mask.len(),
            });
        }

        let keep = |i: &usize| mask[*i];
        let indices: Vec<usize> = (0..self.len()).filter(keep).collect();
        self.take(&indices)
    }

    /// Gather rows by position, in the order given
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&idx| idx >= self.len()) {
            return Err(DataError::IndexOutOfBounds {
                index: bad,
                len: self.len(),
            });
        }

        Ok(match self {
            Series::Float(arr) => Series::Float(indices.iter().map(|&i| arr[i]).collect()),
            Series::Int(arr) => Series::Int(indices.iter().map(|&i| arr[i]).collect()),
            Series::Bool(arr) => Series::Bool(indices.iter().map(|&i| arr[i]).collect()),
            Series::Date(arr) => Series::Date(indices.iter().map(|&i| arr[i]).collect()),
            Series::String(arr) => {
                Series::String(indices.iter().map(|&i| arr[i].clone()).collect())
            }
        })
    }

    /// Convert to a float array if the column is numeric.
    ///
    /// Ints and bools are widened; dates and strings are rejected.
    pub fn to_float(&self) -> Option<FloatArray> {
        match self {
            Series::Float(arr) => Some(arr.clone()),
            Series::Int(arr) => Some(arr.mapv(|v| v as f64)),
            Series::Bool(arr) => Some(arr.mapv(|v| if v { 1.0 } else { 0.0 })),
            Series::Date(_) | Series::String(_) => None,
        }
    }

    /// Borrow the date values
    pub fn as_dates(&self) -> Option<&[NaiveDate]> {
        match self {
            Series::Date(arr) => Some(arr.as_slice()),
            _ => None,
        }
    }

    /// Borrow the boolean values
    pub fn as_bools(&self) -> Option<&BoolArray> {
        match self {
            Series::Bool(arr) => Some(arr),
            _ => None,
        }
    }

    /// Count of non-missing cells. Only float `NaN` counts as missing.
    pub fn count_valid(&self) -> usize {
        match self {
            Series::Float(arr) => arr.iter().filter(|v| !v.is_nan()).count(),
            other => other.len(),
        }
    }

    /// Mean of the non-missing values, `None` for non-numeric or all-missing columns
    pub fn mean(&self) -> Option<f64> {
        let values = self.to_float()?;
        let (sum, n) = values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
        (n > 0).then(|| sum / n as f64)
    }
}

/// Enum for type-safe value access
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Date(NaiveDate),
    String(String),
}

impl SeriesValue {
    /// Numeric view of the value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SeriesValue::Float(v) => Some(*v),
            SeriesValue::Int(v) => Some(*v as f64),
            SeriesValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeriesValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesValue::Float(v) => write!(f, "{}", v),
            SeriesValue::Int(v) => write!(f, "{}", v),
            SeriesValue::Bool(v) => write!(f, "{}", v),
            SeriesValue::Date(v) => write!(f, "{}", v),
            SeriesValue::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<Array1<f64>> for Series {
    fn from(arr: Array1<f64>) -> Self {
        Series::Float(arr)
    }
}
