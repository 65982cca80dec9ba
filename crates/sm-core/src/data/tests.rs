//! Tests for data module

use chrono::NaiveDate;

use super::*;

#[test]
fn test_series_creation() {
    let float_series = Series::float(vec![1.0, 2.0, 3.0]);
    assert_eq!(float_series.len(), 3);
    assert_eq!(float_series.dtype(), "float64");

    let int_series = Series::int(vec![1, 2, 3]);
    assert_eq!(int_series.dtype(), "int64");

    let bool_series = Series::bool(vec![true, false, true]);
    assert_eq!(bool_series.dtype(), "bool");

    let date_series = Series::date(vec![NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()]);
    assert_eq!(date_series.dtype(), "date");
    assert_eq!(date_series.column_type(), ColumnType::Date);

    let string_series = Series::string(vec!["a".to_string(), "b".to_string()]);
    assert_eq!(string_series.len(), 2);
    assert_eq!(string_series.dtype(), "string");
}

#[test]
fn test_series_mean_skips_missing() {
    let series = Series::float(vec![1.0, f64::NAN, 3.0]);
    assert_eq!(series.mean(), Some(2.0));
    assert_eq!(series.count_valid(), 2);
    assert_eq!(Series::float(vec![f64::NAN]).mean(), None);
    assert_eq!(Series::string(vec!["x".to_string()]).mean(), None);
}

#[test]
fn test_dataframe_creation() {
    let df = DataFrame::from_columns(vec![
        ("x", Series::float(vec![1.0, 2.0, 3.0])),
        ("y", Series::int(vec![4, 5, 6])),
    ])
    .unwrap();

    assert_eq!(df.shape(), (3, 2));
    assert_eq!(df.column_names(), vec!["x", "y"]);
}

#[test]
fn test_dataframe_length_mismatch() {
    let err = DataFrame::from_columns(vec![
        ("x", Series::float(vec![1.0, 2.0, 3.0])),
        ("y", Series::int(vec![4, 5])),
    ])
    .unwrap_err();

    assert!(matches!(
        err,
        DataError::LengthMismatch { ref column, expected: 3, actual: 2 } if column == "y"
    ));
}

#[test]
fn test_schema_and_resolve() {
    let df = DataFrame::from_columns(vec![
        ("date", Series::date(vec![NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()])),
        ("ics_all", Series::float(vec![99.8])),
    ])
    .unwrap();

    let schema = df.schema();
    assert_eq!(schema.len(), 2);
    assert_eq!(schema.field("ics_all").unwrap().dtype, ColumnType::Float);
    assert_eq!(schema.position("date"), Some(0));

    assert_eq!(df.resolve(&["ics_all", "date"]).unwrap(), vec![1, 0]);
    assert!(matches!(
        df.resolve(&["ics_all", "UNRATE"]),
        Err(DataError::ColumnNotFound(c)) if c == "UNRATE"
    ));
}

#[test]
fn test_dataframe_select() {
    let df = DataFrame::from_columns(vec![
        ("a", Series::float(vec![1.0, 2.0, 3.0])),
        ("b", Series::float(vec![4.0, 5.0, 6.0])),
        ("c", Series::float(vec![7.0, 8.0, 9.0])),
    ])
    .unwrap();

    let selected = df.select(["a", "c"]).unwrap();
    assert_eq!(selected.shape(), (3, 2));
    assert_eq!(selected.column_names(), vec!["a", "c"]);
}

#[test]
fn test_dataframe_filter() {
    let df = DataFrame::from_columns(vec![
        ("x", Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0])),
        ("y", Series::int(vec![1, 2, 3, 4, 5])),
    ])
    .unwrap();

    let mask = vec![true, false, true, false, true];
    let filtered = df.filter(&mask).unwrap();

    assert_eq!(filtered.shape(), (3, 2));
    assert_eq!(filtered.float_column("x").unwrap().to_vec(), vec![1.0, 3.0, 5.0]);

    let by_row = df
        .filter_with(|row| row.get_float("y").ok().flatten().is_some_and(|y| y > 3.0))
        .unwrap();
    assert_eq!(by_row.nrows(), 2);
}

#[test]
fn test_dataframe_rename_keeps_position() {
    let df = DataFrame::from_columns(vec![
        ("CORESTICKM159SFRBATL", Series::float(vec![1.0])),
        ("UNRATE", Series::float(vec![2.0])),
    ])
    .unwrap();

    let renamed = df.rename(&[("CORESTICKM159SFRBATL", "core_cpi")]).unwrap();
    assert_eq!(renamed.column_names(), vec!["core_cpi", "UNRATE"]);

    let err = renamed.rename(&[("core_cpi", "UNRATE")]).unwrap_err();
    assert!(matches!(err, DataError::DuplicateColumn(_)));
}

#[test]
fn test_float_column_type_mismatch() {
    let df = DataFrame::from_columns(vec![(
        "Month",
        Series::string(vec!["January".to_string()]),
    )])
    .unwrap();

    assert!(matches!(
        df.float_column("Month"),
        Err(DataError::TypeMismatch { .. })
    ));
}

#[test]
fn test_numeric_matrix() {
    let df = DataFrame::from_columns(vec![
        ("a", Series::float(vec![1.0, 2.0, 3.0])),
        ("b", Series::int(vec![4, 5, 6])),
        ("c", Series::bool(vec![true, false, true])),
    ])
    .unwrap();

    let matrix = df.numeric_matrix(&["a", "b", "c"]).unwrap();
    assert_eq!(matrix.shape(), &[3, 3]);
    assert_eq!(matrix[[0, 0]], 1.0);
    assert_eq!(matrix[[0, 1]], 4.0);
    assert_eq!(matrix[[0, 2]], 1.0);
}

#[test]
fn test_builder_pattern() {
    let df = DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0, 2.0, 3.0]))
        .unwrap()
        .with_column("y", Series::int(vec![4, 5, 6]))
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(df.shape(), (3, 2));

    let err = DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0]))
        .unwrap()
        .with_column("x", Series::float(vec![2.0]))
        .unwrap_err();
    assert!(matches!(err, DataError::DuplicateColumn(_)));
}

#[test]
fn test_take_and_rows() {
    let df = DataFrame::from_columns(vec![("x", Series::float(vec![1.0, 2.0, 3.0]))]).unwrap();

    let taken = df.take(&[2, 0]).unwrap();
    assert_eq!(taken.float_column("x").unwrap().to_vec(), vec![3.0, 1.0]);
    assert!(matches!(
        df.take(&[3]),
        Err(DataError::IndexOutOfBounds { index: 3, len: 3 })
    ));

    let values: Vec<f64> = df
        .rows()
        .filter_map(|row| row.get_float("x").ok().flatten())
        .collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0]);
}
