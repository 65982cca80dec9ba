use std::fmt;

use ndarray::{Array2, ArrayView1};
use serde::Serialize;

use crate::data::{DataError, DataFrame, FloatArray, Result};

/// Outcome of correlating one pair of columns over their complete rows
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pair {
    Defined { r: f64, n: usize },
    TooFew { n: usize },
    ConstantX,
    ConstantY,
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Deviations from the mean divided by the largest absolute deviation, so
/// their squares stay finite for any finite input.
fn scaled_deviations(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let mean = values.iter().map(|v| v / n).sum::<f64>();
    let dev: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let max = dev.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
    if max > 0.0 && max.is_finite() {
        dev.iter().map(|d| d / max).collect()
    } else {
        dev
    }
}

fn pair_stats(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Pair {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (a, b))
        .unzip();

    let n = xs.len();
    if n < 2 {
        return Pair::TooFew { n };
    }
    if is_constant(&xs) {
        return Pair::ConstantX;
    }
    if is_constant(&ys) {
        return Pair::ConstantY;
    }

    let dev_x = scaled_deviations(&xs);
    let dev_y = scaled_deviations(&ys);

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (&dx, &dy) in dev_x.iter().zip(&dev_y) {
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let r = (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0);
    Pair::Defined { r, n }
}

/// Pearson correlation over the rows where both values are present.
///
/// Returns `None` when fewer than two complete rows remain or either side is
/// constant.
pub fn pearson(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Option<f64> {
    match pair_stats(x, y) {
        Pair::Defined { r, .. } => Some(r),
        _ => None,
    }
}

/// Symmetric matrix of pairwise-complete Pearson correlations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    /// Column names, in row/column order
    pub names: Vec<String>,
    /// Correlation coefficients
    pub values: Array2<f64>,
    /// Number of complete rows behind each coefficient
    pub observations: Array2<usize>,
}

impl CorrelationMatrix {
    /// Coefficient for a pair of columns by name
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[(i, j)])
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<20}", "")?;
        for name in &self.names {
            write!(f, " {:>12.12}", name)?;
        }
        writeln!(f)?;

        for (i, name) in self.names.iter().enumerate() {
            write!(f, "{:<20.20}", name)?;
            for j in 0..self.names.len() {
                write!(f, " {:>12.4}", self.values[(i, j)])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Pearson correlation between every pair of `columns`.
///
/// Each pair uses only the rows where both values are present. A column that
/// is constant (or has fewer than two usable rows) within any pair fails with
/// `DegenerateColumn`.
pub fn correlation_matrix<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<CorrelationMatrix> {
    df.resolve(columns)?;
    let names: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
    let data: Vec<FloatArray> = names
        .iter()
        .map(|name| df.float_column(name))
        .collect::<Result<_>>()?;

    let k = names.len();
    let mut values = Array2::<f64>::zeros((k, k));
    let mut observations = Array2::<usize>::zeros((k, k));

    for i in 0..k {
        for j in i..k {
            match pair_stats(data[i].view(), data[j].view()) {
                Pair::Defined { r, n } => {
                    // Exactly one on the diagonal, whatever rounding did.
                    let r = if i == j { 1.0 } else { r };
                    values[(i, j)] = r;
                    values[(j, i)] = r;
                    observations[(i, j)] = n;
                    observations[(j, i)] = n;
                }
                Pair::TooFew { n } => {
                    return Err(DataError::DegenerateColumn {
                        column: names[i].clone(),
                        reason: format!("only {} complete rows shared with '{}'", n, names[j]),
                    });
                }
                Pair::ConstantX => {
                    return Err(DataError::DegenerateColumn {
                        column: names[i].clone(),
                        reason: format!("zero variance over rows shared with '{}'", names[j]),
                    });
                }
                Pair::ConstantY => {
                    return Err(DataError::DegenerateColumn {
                        column: names[j].clone(),
                        reason: format!("zero variance over rows shared with '{}'", names[i]),
                    });
                }
            }
        }
    }

    Ok(CorrelationMatrix {
        names,
        values,
        observations,
    })
}
