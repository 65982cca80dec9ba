use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::data::{DataError, DataFrame, Result, Series};

/// Value of a grouping column
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Bool(bool),
    Int(i64),
    Date(NaiveDate),
    Str(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Bool(v) => write!(f, "{}", v),
            GroupKey::Int(v) => write!(f, "{}", v),
            GroupKey::Date(v) => write!(f, "{}", v),
            GroupKey::Str(v) => write!(f, "{}", v),
        }
    }
}

fn group_keys(df: &DataFrame, group_by: &str) -> Result<Vec<GroupKey>> {
    match df.column(group_by)? {
        Series::Bool(v) => Ok(v.iter().copied().map(GroupKey::Bool).collect()),
        Series::Int(v) => Ok(v.iter().copied().map(GroupKey::Int).collect()),
        Series::Date(v) => Ok(v.iter().copied().map(GroupKey::Date).collect()),
        Series::String(v) => Ok(v.iter().cloned().map(GroupKey::Str).collect()),
        other => Err(DataError::TypeMismatch {
            column: group_by.to_string(),
            expected: "bool, int, date or string",
            actual: other.dtype(),
        }),
    }
}

/// Mean of `value` within each distinct value of `group_by`.
///
/// Missing values are ignored. Groups are returned in order of first
/// appearance; a group left with no values fails with `EmptyGroup`.
pub fn group_mean(df: &DataFrame, group_by: &str, value: &str) -> Result<IndexMap<GroupKey, f64>> {
    let keys = group_keys(df, group_by)?;
    let values = df.float_column(value)?;

    let mut acc: IndexMap<GroupKey, (f64, usize)> = IndexMap::new();
    for (key, &v) in keys.into_iter().zip(values.iter()) {
        let entry = acc.entry(key).or_insert((0.0, 0));
        if !v.is_nan() {
            entry.0 += v;
            entry.1 += 1;
        }
    }

    acc.into_iter()
        .map(|(key, (sum, n))| {
            if n == 0 {
                Err(DataError::EmptyGroup {
                    column: value.to_string(),
                    group: key.to_string(),
                })
            } else {
                Ok((key, sum / n as f64))
            }
        })
        .collect()
}
