//! Tests for linear regression models

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use ndarray::{Array1, array};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::base::{FittedModel, INTERCEPT, ModelError};
use crate::lm::ols::fit_arrays;
use crate::lm::{Diagnostics, LinearConfig, LinearRegression, MissingPolicy};
use crate::report::ModelReport;
use sm_core::data::{DataError, DataFrame, DataFrameBuilder, Series};

// ==================== Test Fixtures ====================

/// Noise-free y = 2 + 3 x1 - 1.5 x2
fn exact_data() -> DataFrame {
    let x1 = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
    let x2 = vec![2.0, 1.0, 4.0, 3.0, 6.0, 5.0, 8.0, 9.0];
    let y: Vec<f64> = x1
        .iter()
        .zip(&x2)
        .map(|(a, b)| 2.0 + 3.0 * a - 1.5 * b)
        .collect();

    DataFrameBuilder::new()
        .with_column("x1", Series::float(x1))
        .unwrap()
        .with_column("x2", Series::float(x2))
        .unwrap()
        .with_column("y", Series::float(y))
        .unwrap()
        .build()
        .unwrap()
}

/// Realistic dataset with some noise, monthly dates from 2008-01-15
fn noisy_data(n: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.5).unwrap();

    let mut dates = Vec::new();
    let mut x1 = Vec::new();
    let mut x2 = Vec::new();
    let mut y = Vec::new();

    for i in 0..n {
        let year = 2008 + (i / 12) as i32;
        let month = (i % 12) as u32 + 1;
        dates.push(NaiveDate::from_ymd_opt(year, month, 15).unwrap());

        let a = i as f64 * 0.1;
        let b = (i as f64).sin();
        x1.push(a);
        x2.push(b);
        y.push(1.0 + 2.0 * a + 3.0 * b + noise.sample(&mut rng));
    }

    DataFrame::from_columns(vec![
        ("date", Series::date(dates)),
        ("x1", Series::float(x1)),
        ("x2", Series::float(x2)),
        ("y", Series::float(y)),
    ])
    .unwrap()
}

// ==================== Fitting ====================

#[test]
fn test_recovers_exact_coefficients() {
    let model = LinearRegression::new("y")
        .predictors(["x1", "x2"])
        .fit(&exact_data())
        .unwrap();

    let params = model.params();
    assert_eq!(params.len(), 3);
    assert_abs_diff_eq!(params[0], 2.0, epsilon = 1e-9);
    assert_abs_diff_eq!(params[1], 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(params[2], -1.5, epsilon = 1e-9);

    let names: Vec<&str> = model.coefficients().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec![INTERCEPT, "x1", "x2"]);
    assert!(model.coefficients()[0].is_intercept);
    assert_abs_diff_eq!(model.statistics().r_squared, 1.0, epsilon = 1e-12);
}

#[test]
fn test_fitted_plus_residual_is_actual() {
    let model = LinearRegression::new("y")
        .predictors(["x1", "x2"])
        .fit(&noisy_data(60, 7))
        .unwrap();

    for ((f, r), a) in model
        .fitted_values()
        .iter()
        .zip(model.residuals().iter())
        .zip(model.actual().iter())
    {
        assert_abs_diff_eq!(f + r, *a, epsilon = 1e-10);
    }
}

#[test]
fn test_predict_training_row_matches_fitted() {
    let df = noisy_data(40, 11);
    let model = LinearRegression::new("y").predictors(["x1", "x2"]).fit(&df).unwrap();
    let x1 = df.float_column("x1").unwrap();
    let x2 = df.float_column("x2").unwrap();

    for (i, &row) in model.training_rows().iter().enumerate() {
        let pred = model.predict(&[("x1", x1[row]), ("x2", x2[row])]).unwrap();
        assert_eq!(pred, model.fitted_values()[i]);
    }

    let frame_preds = model.predict_frame(&df).unwrap();
    assert_eq!(&frame_preds, model.fitted_values());
}

#[test]
fn test_noisy_fit_statistics() {
    let model = LinearRegression::new("y")
        .predictors(["x1", "x2"])
        .fit(&noisy_data(120, 3))
        .unwrap();
    let stats = model.statistics();

    assert_eq!(stats.n_obs, 120);
    assert_eq!(stats.df_residual, 117);
    assert_eq!(stats.df_model, 2);
    assert!(stats.r_squared > 0.95 && stats.r_squared <= 1.0);
    assert!(stats.adj_r_squared <= stats.r_squared);
    assert!(stats.f_p_value.unwrap() < 1e-10);
    assert_abs_diff_eq!(stats.residual_std_error, 0.5, epsilon = 0.15);

    for coef in model.coefficients() {
        assert!(coef.ci_lower < coef.estimate && coef.estimate < coef.ci_upper);
        assert!(coef.std_error > 0.0);
    }
    assert_abs_diff_eq!(model.params()[1], 2.0, epsilon = 0.1);
    assert_abs_diff_eq!(model.params()[2], 3.0, epsilon = 0.3);
    assert_eq!(model.coefficients()[1].significance(), "***");
}

#[test]
fn test_matches_closed_form_simple_regression() {
    let x = array![1.0, 2.0, 3.0, 4.0, 5.0];
    let y = array![2.1, 3.9, 6.2, 7.8, 10.1];
    let model = fit_arrays("y", &y, &[("x", x.clone())], &LinearConfig::default()).unwrap();

    let mx = x.mean().unwrap();
    let my = y.mean().unwrap();
    let sxx: f64 = x.iter().map(|v| (v - mx).powi(2)).sum();
    let sxy: f64 = x.iter().zip(y.iter()).map(|(a, b)| (a - mx) * (b - my)).sum();
    let slope = sxy / sxx;

    assert_abs_diff_eq!(model.params()[1], slope, epsilon = 1e-10);
    assert_abs_diff_eq!(model.params()[0], my - slope * mx, epsilon = 1e-10);

    let sigma2 = model.rss() / 3.0;
    assert_abs_diff_eq!(model.standard_errors()[1], (sigma2 / sxx).sqrt(), epsilon = 1e-10);

    // Leverage of simple regression: 1/n + (x - mean)^2 / Sxx
    for (i, &xi) in x.iter().enumerate() {
        let h = 1.0 / 5.0 + (xi - mx).powi(2) / sxx;
        assert_abs_diff_eq!(model.leverage()[i], h, epsilon = 1e-10);

        let e = model.residuals()[i];
        let cook = e * e * h / (2.0 * sigma2 * (1.0 - h).powi(2));
        assert_abs_diff_eq!(model.cooks_distance()[i], cook, epsilon = 1e-10);
    }
}

#[test]
fn test_intercept_only_model() {
    let y = array![1.0, 2.0, 3.0, 6.0];
    let model = fit_arrays("y", &y, &[], &LinearConfig::default()).unwrap();

    assert_abs_diff_eq!(model.params()[0], 3.0, epsilon = 1e-12);
    assert!(model.statistics().f_statistic.is_none());
    assert_eq!(model.predict(&[]).unwrap(), model.params()[0]);
}

// ==================== Failure modes ====================

#[test]
fn test_insufficient_data() {
    let df = exact_data().take(&[0, 1, 2]).unwrap();
    let err = LinearRegression::new("y")
        .predictors(["x1", "x2"])
        .fit(&df)
        .unwrap_err();

    assert!(matches!(
        err,
        ModelError::InsufficientData {
            n_samples: 3,
            n_params: 3
        }
    ));
}

#[test]
fn test_collinear_predictors() {
    let x = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let doubled = &x * 2.0;
    let y = array![1.0, 3.0, 2.0, 5.0, 4.0, 6.0];

    let err = fit_arrays(
        "y",
        &y,
        &[("x", x.clone()), ("x_doubled", doubled)],
        &LinearConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ModelError::CollinearPredictors { ref column } if column == "x_doubled"));

    // A constant predictor duplicates the intercept
    let flat = Array1::from_elem(6, 4.0);
    let err = fit_arrays("y", &y, &[("flat", flat)], &LinearConfig::default()).unwrap_err();
    assert!(matches!(err, ModelError::CollinearPredictors { ref column } if column == "flat"));
}

#[test]
fn test_predictor_units_do_not_affect_rank() {
    let x = array![1.0, 2.0, 3.5, 4.0, 5.5, 7.0];
    let y = array![1.2, 2.1, 3.4, 3.5, 4.9, 5.6];
    let config = LinearConfig::default();
    let base = fit_arrays("y", &y, &[("x", x.clone())], &config).unwrap();

    for unit in [1e12, 1e-12, 1e-24] {
        let scaled = fit_arrays("y", &y, &[("x", &x * unit)], &config).unwrap();
        assert_abs_diff_eq!(scaled.params()[0], base.params()[0], epsilon = 1e-8);
        assert_abs_diff_eq!(scaled.params()[1] * unit, base.params()[1], epsilon = 1e-8);
        assert_abs_diff_eq!(
            scaled.standard_errors()[1] * unit,
            base.standard_errors()[1],
            epsilon = 1e-8
        );
        assert_abs_diff_eq!(
            scaled.statistics().r_squared,
            base.statistics().r_squared,
            epsilon = 1e-10
        );
    }
}

#[test]
fn test_length_mismatch() {
    let err = fit_arrays(
        "y",
        &array![1.0, 2.0, 3.0, 4.0],
        &[("x", array![1.0, 2.0, 3.0])],
        &LinearConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ModelError::Data(DataError::LengthMismatch { expected: 4, actual: 3, .. })
    ));
}

#[test]
fn test_unknown_column() {
    let err = LinearRegression::new("y")
        .predictors(["UNRATE"])
        .fit(&exact_data())
        .unwrap_err();
    assert!(matches!(err, ModelError::Data(DataError::ColumnNotFound(c)) if c == "UNRATE"));
}

#[test]
fn test_invalid_config() {
    let config = LinearConfig {
        confidence_level: 1.5,
        ..LinearConfig::default()
    };
    let err = LinearRegression::new("y")
        .predictors(["x1"])
        .config(config)
        .fit(&exact_data())
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidConfig { .. }));
}

#[test]
fn test_predict_schema_mismatch() {
    let model = LinearRegression::new("y")
        .predictors(["x1", "x2"])
        .fit(&exact_data())
        .unwrap();

    // Wrong order
    let err = model.predict(&[("x2", 1.0), ("x1", 1.0)]).unwrap_err();
    assert!(matches!(
        err,
        ModelError::SchemaMismatch { ref expected, ref actual }
            if expected == &["x1", "x2"] && actual == &["x2", "x1"]
    ));

    // Missing predictor
    assert!(model.predict(&[("x1", 1.0)]).is_err());

    let frame = DataFrame::from_columns(vec![("x1", Series::float(vec![1.0]))]).unwrap();
    assert!(matches!(
        model.predict_frame(&frame),
        Err(ModelError::SchemaMismatch { .. })
    ));
}

// ==================== Missing values ====================

fn data_with_gap() -> DataFrame {
    let df = exact_data();
    let mut x1 = df.float_column("x1").unwrap();
    x1[2] = f64::NAN;
    df.drop(&["x1"]).unwrap().with_column("x1", Series::float(x1)).unwrap()
}

#[test]
fn test_missing_rows_dropped() {
    let model = LinearRegression::new("y")
        .predictors(["x1", "x2"])
        .fit(&data_with_gap())
        .unwrap();

    assert_eq!(model.dropped_rows(), 1);
    assert_eq!(model.training_rows(), &[0, 1, 3, 4, 5, 6, 7]);
    assert_abs_diff_eq!(model.params()[1], 3.0, epsilon = 1e-9);
}

#[test]
fn test_missing_rows_raise() {
    let config = LinearConfig {
        missing: MissingPolicy::Raise,
        ..LinearConfig::default()
    };
    let err = LinearRegression::new("y")
        .predictors(["x1", "x2"])
        .config(config)
        .fit(&data_with_gap())
        .unwrap_err();
    assert!(matches!(err, ModelError::Data(DataError::MissingData(_))));
}

// ==================== Summary, diagnostics, reports ====================

#[test]
fn test_summary_renders_table() {
    let model = LinearRegression::new("y")
        .predictors(["x1", "x2"])
        .fit(&noisy_data(50, 5))
        .unwrap();
    let summary = model.summary("demo");

    assert_eq!(summary.formula(), "y ~ x1 + x2");
    assert_eq!(summary.coefficients.len(), 3);
    assert!(summary.coefficient("x1").is_some());
    assert_abs_diff_eq!(summary.residual_statistics.mean, 0.0, epsilon = 1e-10);

    let text = summary.to_string();
    assert!(text.contains("Coefficients:"));
    assert!(text.contains("(Intercept)"));
    assert!(text.contains("Signif. codes"));
}

#[test]
fn test_diagnostics() {
    let model = LinearRegression::new("y")
        .predictors(["x1", "x2"])
        .key("date")
        .fit(&noisy_data(80, 13))
        .unwrap();
    let diag = Diagnostics::run_all(&model);

    assert_eq!(diag.vif.len(), 2);
    for v in &diag.vif {
        assert!(v.vif >= 1.0 - 1e-9);
        assert_abs_diff_eq!(v.tolerance * v.vif, 1.0, epsilon = 1e-12);
    }
    let dw = diag.durbin_watson.statistic;
    assert!((0.0..=4.0).contains(&dw));
    for o in &diag.cooks_outliers {
        assert!(o.distance > o.threshold);
        assert!(o.date.is_some());
    }

    let dw_alt = Diagnostics::durbin_watson(&array![1.0, -1.0, 1.0, -1.0]);
    assert_abs_diff_eq!(dw_alt.statistic, 3.0, epsilon = 1e-12);
}

#[test]
fn test_report_marks_training_rows() {
    let df = noisy_data(36, 17);
    let cutoff = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
    let mask: Vec<bool> = df.date_column("date").unwrap().iter().map(|d| *d < cutoff).collect();
    let train = df.filter(&mask).unwrap();

    let model = LinearRegression::new("y")
        .predictors(["x1", "x2"])
        .key("date")
        .fit(&train)
        .unwrap();
    let report = ModelReport::build(&model, &df, "date").unwrap();

    assert_eq!(report.len(), 36);
    assert_eq!(report.training_rows().count(), 24);
    for row in &report.rows {
        match (row.fitted, row.residual) {
            (Some(f), Some(r)) => {
                assert!(row.date < cutoff);
                assert_eq!(f, row.predicted);
                assert_abs_diff_eq!(f + r, row.actual, epsilon = 1e-10);
            }
            (None, None) => assert!(row.date >= cutoff),
            _ => panic!("fitted and residual must be present together"),
        }
    }

    let frame = report.to_frame().unwrap();
    assert_eq!(frame.column_names(), vec!["date", "actual", "predicted", "fitted", "residual"]);
    assert!(frame.float_column("fitted").unwrap()[30].is_nan());
}

#[test]
fn test_report_csv() {
    let df = noisy_data(12, 1);
    let model = LinearRegression::new("y").predictors(["x1"]).fit(&df).unwrap();
    let report = ModelReport::build(&model, &df, "date").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");
    report.write_csv(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("date,actual,predicted,fitted,residual"));
    assert_eq!(lines.count(), 12);
}

#[test]
fn test_model_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<crate::lm::OlsModel>();
}

proptest! {
    #[test]
    fn prop_residual_identity(
        rows in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 6..30)
    ) {
        let x: Array1<f64> = rows.iter().enumerate().map(|(i, r)| r.0 + i as f64 * 0.37).collect();
        let y: Array1<f64> = rows.iter().map(|r| r.1).collect();

        if let Ok(model) = fit_arrays("y", &y, &[("x", x)], &LinearConfig::default()) {
            for (i, (&f, &r)) in model.fitted_values().iter().zip(model.residuals().iter()).enumerate() {
                prop_assert!((f + r - y[i]).abs() <= 1e-9 * (1.0 + y[i].abs()));
            }
            let sum: f64 = model.residuals().sum();
            prop_assert!(sum.abs() <= 1e-7 * (1.0 + y.mapv(f64::abs).sum()));
        }
    }
}
