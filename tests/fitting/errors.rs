//! Input validation before and during a fit.

use deuteron_fit::lineshape::evaluate;
use deuteron_fit::{
    fit_deuteron, ConvergenceStatus, FitConfig, FitError, LineshapeParams, LmConfig, ParamName,
    Spectrum,
};
use ndarray::Array1;
use std::collections::HashMap;
use std::io::Write;

use crate::test_helpers::{broadened_values, sweep};

#[test]
fn test_shape_mismatch_is_rejected_before_fitting() {
    let freqs = sweep(100);
    let signal = Array1::zeros(99);
    let params = LineshapeParams::new(broadened_values());

    let err = fit_deuteron(&freqs, &signal, params, &LmConfig::default()).unwrap_err();
    assert!(matches!(err, FitError::DimensionMismatch(_)));

    let err = Spectrum::new(freqs, Array1::zeros(99)).unwrap_err();
    assert!(matches!(err, FitError::DimensionMismatch(_)));
}

#[test]
fn test_missing_parameter_is_reported_by_name() {
    let mut values: HashMap<String, f64> = [
        ("A", 0.03),
        ("G", -0.00003),
        ("r", 1.2),
        ("wQ", 0.027),
        ("wL", 32.69),
        ("eta", -0.02),
        ("xi", -0.001),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    assert!(LineshapeParams::from_values(values.clone()).is_ok());

    values.remove("eta");
    match LineshapeParams::from_values(values) {
        Err(FitError::MissingParameter(name)) => assert_eq!(name, "eta"),
        other => panic!("expected a missing parameter, got {:?}", other),
    }
}

#[test]
fn test_too_few_points() {
    let freqs = sweep(7);
    let signal = evaluate(&freqs, &broadened_values());
    let params = LineshapeParams::new(broadened_values());

    let err = fit_deuteron(&freqs, &signal, params, &LmConfig::default()).unwrap_err();
    assert!(matches!(err, FitError::InvalidInput(_)));
}

#[test]
fn test_everything_fixed() {
    let freqs = sweep(20);
    let signal = evaluate(&freqs, &broadened_values());
    let mut params = LineshapeParams::new(broadened_values());
    for name in ParamName::ALL {
        params[name].set_vary(false);
    }

    let err = fit_deuteron(&freqs, &signal, params, &LmConfig::default()).unwrap_err();
    assert!(matches!(err, FitError::InvalidInput(_)));
}

#[test]
fn test_non_finite_start_is_an_error() {
    let freqs = sweep(50);
    let signal = evaluate(&freqs, &broadened_values());
    // a negative asymmetry makes r^(3QR) undefined
    let mut params = LineshapeParams::new(broadened_values());
    params[ParamName::R].set_value(-1.0).unwrap();

    let err = fit_deuteron(&freqs, &signal, params, &LmConfig::default()).unwrap_err();
    assert!(matches!(err, FitError::FunctionEvaluation(_)));
}

#[test]
fn test_iteration_limit_is_reported_not_raised() {
    let freqs = sweep(200);
    let signal = evaluate(&freqs, &broadened_values());
    let start = LineshapeParams::from_values([
        ("A", 0.08),
        ("G", 0.5),
        ("r", 1.1),
        ("wQ", 0.025),
        ("wL", 32.68),
        ("eta", 0.2),
        ("xi", 0.0),
    ])
    .unwrap();
    let config = LmConfig {
        max_iterations: 1,
        ..LmConfig::default()
    };

    let result = fit_deuteron(&freqs, &signal, start, &config).unwrap();
    assert!(!result.success);
    assert_eq!(result.status, ConvergenceStatus::MaxIterationsReached);
    assert_eq!(result.iterations, 1);
}

#[test]
fn test_fit_from_config_file() {
    let truth = broadened_values();
    let freqs = sweep(200);
    let signal = evaluate(&freqs, &truth);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "parameters": {{
                "A": {{ "value": 0.04, "min": 0.0 }},
                "G": 0.8,
                "r": {{ "value": 1.3, "min": 0.0 }},
                "wQ": {{ "value": 0.028, "min": 0.0 }},
                "wL": {{ "value": 32.69, "vary": false }},
                "eta": 0.08,
                "xi": 0.0
            }},
            "optimizer": {{ "max_iterations": 100 }}
        }}"#
    )
    .unwrap();

    let config = FitConfig::from_path(file.path()).unwrap();
    let result = fit_deuteron(&freqs, &signal, config.parameters, &config.optimizer).unwrap();

    assert!(result.success, "{}", result);
    assert!((result.params[ParamName::R].value() - truth.r).abs() < 1e-6);
    assert_eq!(result.nvarys, 6);
}
