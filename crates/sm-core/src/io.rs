//! Delimited-file loading into typed tables

mod loader;

pub use loader::{ColumnNaming, CsvLoader};
