//! Inner joins of time-series tables on a shared key column

use std::collections::HashMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use tracing::debug;

use crate::data::{DataError, DataFrame, Result, Series};

/// Hashable view of a key cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyValue {
    Date(NaiveDate),
    Int(i64),
    Str(String),
}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyValue::Date(v) => write!(f, "{}", v),
            KeyValue::Int(v) => write!(f, "{}", v),
            KeyValue::Str(v) => write!(f, "{}", v),
        }
    }
}

fn key_values(df: &DataFrame, key: &str) -> Result<Vec<KeyValue>> {
    let series = df.column(key)?;
    match series {
        Series::Date(v) => Ok(v.iter().copied().map(KeyValue::Date).collect()),
        Series::Int(v) => Ok(v.iter().copied().map(KeyValue::Int).collect()),
        Series::String(v) => Ok(v.iter().cloned().map(KeyValue::Str).collect()),
        other => Err(DataError::TypeMismatch {
            column: key.to_string(),
            expected: "date, int or string key",
            actual: other.dtype(),
        }),
    }
}

/// Map each key to its row position, rejecting repeated keys
fn index_keys(keys: Vec<KeyValue>, column: &str) -> Result<HashMap<KeyValue, usize>> {
    let mut index = HashMap::with_capacity(keys.len());
    for (row, k) in keys.into_iter().enumerate() {
        if index.contains_key(&k) {
            return Err(DataError::DuplicateKey {
                column: column.to_string(),
                value: k.to_string(),
            });
        }
        index.insert(k, row);
    }
    Ok(index)
}

/// Inner join of `tables` on `key`.
///
/// Rows of the first table are kept, in order, when every other table has a
/// row with the same key. Non-key column names must be unique across inputs.
pub fn inner_join(tables: &[DataFrame], key: &str) -> Result<DataFrame> {
    let (driver, others) = tables
        .split_first()
        .ok_or_else(|| DataError::InvalidParameter("inner_join needs at least one table".into()))?;

    // Names taken so far, for the collision check.
    let mut owners: HashMap<&str, usize> = HashMap::new();
    for (t, table) in tables.iter().enumerate() {
        table.column(key)?;
        for name in table.column_names() {
            if name == key {
                continue;
            }
            if owners.insert(name, t).is_some() {
                return Err(DataError::ColumnCollision {
                    column: name.to_string(),
                    table: t,
                });
            }
        }
    }

    let driver_keys = key_values(driver, key)?;
    index_keys(driver_keys.clone(), key)?;
    let other_indexes = others
        .iter()
        .map(|t| index_keys(key_values(t, key)?, key))
        .collect::<Result<Vec<_>>>()?;

    // Matching row positions: one vector per table, aligned by output row.
    let mut positions: Vec<Vec<usize>> = vec![Vec::new(); tables.len()];
    'rows: for (row, k) in driver_keys.iter().enumerate() {
        let mut matched = Vec::with_capacity(others.len());
        for index in &other_indexes {
            match index.get(k) {
                Some(&pos) => matched.push(pos),
                None => continue 'rows,
            }
        }
        positions[0].push(row);
        for (t, pos) in matched.into_iter().enumerate() {
            positions[t + 1].push(pos);
        }
    }

    let mut columns: IndexMap<String, Series> = IndexMap::new();
    for (t, table) in tables.iter().enumerate() {
        for (name, series) in &table.columns {
            if t > 0 && name == key {
                continue;
            }
            columns.insert(name.clone(), series.take(&positions[t])?);
        }
    }

    let nrows = positions[0].len();
    debug!(
        key,
        tables = tables.len(),
        driver_rows = driver.nrows(),
        rows = nrows,
        "inner join"
    );
    Ok(DataFrame { columns, nrows })
}
