//! Core data structures for sentimacro
//!
//! Column-major tables with a typed, ordered schema. Every transformation
//! returns a fresh table; nothing here hands out references into mutable
//! upstream state.

mod builder;
mod dataframe;
mod schema;
mod series;

#[cfg(test)]
mod tests;

// Re-exports
pub use builder::DataFrameBuilder;
pub use dataframe::{DataFrame, Row, RowIter};
pub use schema::{ColumnType, Field, Schema};
pub use series::{Series, SeriesValue};

// Type aliases for common use cases
pub type FloatArray = ndarray::Array1<f64>;
pub type IntArray = ndarray::Array1<i64>;
pub type BoolArray = ndarray::Array1<bool>;
pub type DateArray = Vec<chrono::NaiveDate>;
pub type StringArray = Vec<String>;
pub type Matrix = ndarray::Array2<f64>;

/// Error types specific to data operations
#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("Invalid date: year {year}, month {month}")]
    InvalidDate { year: i64, month: i64 },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Length mismatch in column '{column}': expected {expected} rows, got {actual}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Group '{group}' of column '{column}' has no non-missing values")]
    EmptyGroup { column: String, group: String },

    #[error("Column '{column}' is degenerate: {reason}")]
    DegenerateColumn { column: String, reason: String },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Column '{column}' of table {table} collides with an earlier table; rename it before joining")]
    ColumnCollision { column: String, table: usize },

    #[error("Duplicate key {value} in column '{column}'")]
    DuplicateKey { column: String, value: String },

    #[error("Invalid column type for '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Missing data in column: {0}")]
    MissingData(String),

    #[error("Index out of bounds: index {index}, length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to parse '{value}' in column '{column}' of {source_name}")]
    Parse {
        source_name: String,
        column: String,
        value: String,
    },

    #[error("Failed to parse date '{value}' in column '{column}'")]
    DateParse { column: String, value: String },

    #[error("CSV error in {source_name}: {error}")]
    Csv {
        source_name: String,
        #[source]
        error: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for data operations
pub type Result<T> = std::result::Result<T, DataError>;
