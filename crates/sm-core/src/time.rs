//! Temporal alignment of monthly observations
//!
//! Survey rows carry a year and a month, indicator rows carry a reported
//! observation date (the first of the month for FRED series). Both are
//! normalized onto the same mid-month key so they can be joined.

use chrono::{Datelike, Duration, Month, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::data::{DataError, DataFrame, Result, Series, SeriesValue};

/// Day of month every aligned date lands on
pub const ALIGNED_DAY: u32 = 15;

/// Default offset moving a first-of-month observation to mid-month
pub const DEFAULT_SHIFT_DAYS: i64 = 14;

/// Build the canonical date for a (year, month) pair.
pub fn mid_month(year: i32, month: u32) -> Result<NaiveDate> {
    if year <= 0 || !(1..=12).contains(&month) {
        return Err(DataError::InvalidDate {
            year: year as i64,
            month: month as i64,
        });
    }

    NaiveDate::from_ymd_opt(year, month, ALIGNED_DAY).ok_or(DataError::InvalidDate {
        year: year as i64,
        month: month as i64,
    })
}

/// Advance a reported observation by `days` and truncate it to the calendar date.
pub fn shift_days(reported: NaiveDateTime, days: i64) -> NaiveDate {
    (reported + Duration::days(days)).date()
}

/// Re-normalize any date onto day 15 of its month.
pub fn align_to_mid_month(date: NaiveDate) -> NaiveDate {
    // Day 15 exists in every month.
    date.with_day(ALIGNED_DAY).unwrap_or(date)
}

/// Parse a month cell that is either a number (1-12) or an English month name.
pub fn parse_month(value: &SeriesValue) -> Option<i64> {
    match value {
        SeriesValue::Int(m) => Some(*m),
        SeriesValue::Float(m) if m.fract() == 0.0 => Some(*m as i64),
        SeriesValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<Month>().ok().map(|m| m.number_from_month() as i64))
        }
        _ => None,
    }
}

/// Parse an ISO `YYYY-MM-DD` date, tolerating a trailing time component.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Add a date column built from separate year and month columns.
pub fn with_date_from_parts(
    df: &DataFrame,
    year_col: &str,
    month_col: &str,
    out: &str,
) -> Result<DataFrame> {
    let years = df.column(year_col)?;
    let months = df.column(month_col)?;

    let mut dates = Vec::with_capacity(df.nrows());
    for i in 0..df.nrows() {
        let year = years
            .get(i)
            .and_then(|v| v.as_f64())
            .filter(|y| y.is_finite() && y.fract() == 0.0)
            .map(|y| y as i64)
            .ok_or_else(|| DataError::TypeMismatch {
                column: year_col.to_string(),
                expected: "integer year",
                actual: years.dtype(),
            })?;
        let month = months
            .get(i)
            .as_ref()
            .and_then(parse_month)
            .ok_or_else(|| DataError::TypeMismatch {
                column: month_col.to_string(),
                expected: "month number or name",
                actual: months.dtype(),
            })?;

        if !(1..=12).contains(&month) || year <= 0 || year > i32::MAX as i64 {
            return Err(DataError::InvalidDate { year, month });
        }
        dates.push(mid_month(year as i32, month as u32)?);
    }

    df.clone().with_column(out, Series::date(dates))
}

/// Add a date column derived from a reported date shifted by `days`.
///
/// The source may be a date column or ISO date strings.
pub fn with_shifted_date(df: &DataFrame, src_col: &str, days: i64, out: &str) -> Result<DataFrame> {
    let source = df.column(src_col)?;

    let dates: Vec<NaiveDate> = match source {
        Series::Date(values) => values
            .iter()
            .map(|d| shift_days(d.and_time(chrono::NaiveTime::MIN), days))
            .collect(),
        Series::String(values) => values
            .iter()
            .map(|s| {
                parse_date(s)
                    .map(|d| shift_days(d.and_time(chrono::NaiveTime::MIN), days))
                    .ok_or_else(|| DataError::DateParse {
                        column: src_col.to_string(),
                        value: s.clone(),
                    })
            })
            .collect::<Result<_>>()?,
        other => {
            return Err(DataError::TypeMismatch {
                column: src_col.to_string(),
                expected: "date",
                actual: other.dtype(),
            });
        }
    };

    let shifted = Series::date(dates);
    if src_col == out {
        df.clone().drop(&[src_col])?.with_column(out, shifted)
    } else {
        df.clone().with_column(out, shifted)
    }
}

/// Keep rows dated on or after `cutoff`.
pub fn filter_from(df: &DataFrame, date_col: &str, cutoff: NaiveDate) -> Result<DataFrame> {
    let mask: Vec<bool> = df.date_column(date_col)?.iter().map(|d| *d >= cutoff).collect();
    let kept = df.filter(&mask)?;
    debug!(
        column = date_col,
        %cutoff,
        dropped = df.nrows() - kept.nrows(),
        "filtered rows before cutoff"
    );
    Ok(kept)
}

/// Keep rows dated strictly before `end`.
pub fn filter_before(df: &DataFrame, date_col: &str, end: NaiveDate) -> Result<DataFrame> {
    let mask: Vec<bool> = df.date_column(date_col)?.iter().map(|d| *d < end).collect();
    df.filter(&mask)
}

/// Add a boolean column that is `true` for rows on or after `cutoff`.
pub fn with_cutoff_flag(
    df: &DataFrame,
    date_col: &str,
    cutoff: NaiveDate,
    out: &str,
) -> Result<DataFrame> {
    let flags: Vec<bool> = df.date_column(date_col)?.iter().map(|d| *d >= cutoff).collect();
    df.clone().with_column(out, Series::bool(flags))
}

/// Fail if any key value repeats within the column.
pub fn ensure_unique_key(df: &DataFrame, col: &str) -> Result<()> {
    let series = df.column(col)?;
    if !series.column_type().is_key() {
        return Err(DataError::TypeMismatch {
            column: col.to_string(),
            expected: "date, int or string key",
            actual: series.dtype(),
        });
    }

    let mut seen = std::collections::HashSet::with_capacity(series.len());
    for i in 0..series.len() {
        let Some(value) = series.get(i) else { continue };
        if !seen.insert(value.to_string()) {
            return Err(DataError::DuplicateKey {
                column: col.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}
