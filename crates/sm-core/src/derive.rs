//! Derived columns computed elementwise from existing numeric columns

use serde::{Deserialize, Serialize};

use crate::data::{DataError, DataFrame, FloatArray, Result, Series};

/// Apply `f` to each row's values of `inputs`, producing column `name`.
///
/// Inputs are widened to f64; missing cells (`NaN`) are passed through to `f`.
pub fn add_column<F>(df: &DataFrame, name: &str, inputs: &[&str], f: F) -> Result<DataFrame>
where
    F: Fn(&[f64]) -> f64,
{
    if df.has_column(name) {
        return Err(DataError::DuplicateColumn(name.to_string()));
    }

    let columns: Vec<FloatArray> = inputs
        .iter()
        .map(|input| df.float_column(input))
        .collect::<Result<_>>()?;

    let nrows = df.nrows();
    for (input, values) in inputs.iter().zip(&columns) {
        if values.len() != nrows {
            return Err(DataError::LengthMismatch {
                column: input.to_string(),
                expected: nrows,
                actual: values.len(),
            });
        }
    }

    let mut row = vec![0.0; columns.len()];
    let derived: FloatArray = (0..nrows)
        .map(|i| {
            for (slot, values) in row.iter_mut().zip(&columns) {
                *slot = values[i];
            }
            f(row.as_slice())
        })
        .collect();

    df.clone().with_column(name, Series::float(derived))
}

/// Declarative derived column, as read from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DerivedColumn {
    /// `left * right`
    Product {
        name: String,
        left: String,
        right: String,
    },
    /// `column ^ exponent`
    Power {
        name: String,
        column: String,
        exponent: f64,
    },
    /// `sqrt(column)`, `NaN` for negative inputs
    Sqrt { name: String, column: String },
}

impl DerivedColumn {
    /// Name of the produced column
    pub fn name(&self) -> &str {
        match self {
            DerivedColumn::Product { name, .. }
            | DerivedColumn::Power { name, .. }
            | DerivedColumn::Sqrt { name, .. } => name,
        }
    }

    /// Compute the column and return a new table containing it
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            DerivedColumn::Product { name, left, right } => {
                add_column(df, name, &[left.as_str(), right.as_str()], |v| v[0] * v[1])
            }
            DerivedColumn::Power {
                name,
                column,
                exponent,
            } => {
                let exponent = *exponent;
                add_column(df, name, &[column.as_str()], move |v| v[0].powf(exponent))
            }
            DerivedColumn::Sqrt { name, column } => {
                add_column(df, name, &[column.as_str()], |v| v[0].sqrt())
            }
        }
    }
}
