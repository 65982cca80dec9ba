//! Core tables and transformations for the sentiment/macro pipeline
//!
//! A [`DataFrame`] is an ordered set of equal-length named columns. The
//! modules here load such tables from CSV, give them a shared monthly date
//! key, join them on that key, derive new columns and summarize them.

pub mod data;
pub mod derive;
pub mod io;
pub mod join;
pub mod stats;
pub mod time;

pub use data::{ColumnType, DataError, DataFrame, DataFrameBuilder, Result, Schema, Series, SeriesValue};
pub use derive::{DerivedColumn, add_column};
pub use io::{ColumnNaming, CsvLoader};
pub use join::inner_join;
pub use stats::{CorrelationMatrix, GroupKey, correlation_matrix, group_mean, pearson};
