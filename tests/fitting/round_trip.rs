//! Noise-free fits recover the parameters that generated the data.

use approx::assert_relative_eq;
use deuteron_fit::lineshape::evaluate;
use deuteron_fit::{
    fit, fit_deuteron, DiffMethod, LineshapeModel, LineshapeParams, LmConfig, Model, ParamName,
    ParameterSet,
};

use crate::test_helpers::{broadened_values, init_logging, sweep};

fn perturbed_start() -> LineshapeParams {
    LineshapeParams::from_values([
        ("A", 0.06),
        ("G", 1.2),
        ("r", 1.8),
        ("wQ", 0.026),
        ("wL", 32.685),
        ("eta", 0.15),
        ("xi", 0.02),
    ])
    .unwrap()
}

#[test]
fn test_round_trip_forward_differences() {
    init_logging();
    let truth = broadened_values();
    let freqs = sweep(200);
    let signal = evaluate(&freqs, &truth);

    let params = perturbed_start().with_physical_bounds().unwrap();
    let result = fit_deuteron(&freqs, &signal, params, &LmConfig::default()).unwrap();

    assert!(result.success, "{}", result);
    let fitted = result.values();
    for (got, want) in fitted.to_array().iter().zip(truth.to_array()) {
        assert_relative_eq!(*got, want, max_relative = 1e-5);
    }
    assert!(result.chisqr < 1e-16);
    assert!(result.redchi < 1e-18);
    assert_eq!(result.ndata, 200);
    assert_eq!(result.nfree, 193);
}

#[test]
fn test_round_trip_central_differences() {
    let truth = broadened_values();
    let freqs = sweep(200);
    let signal = evaluate(&freqs, &truth);

    let config = LmConfig {
        diff_method: DiffMethod::Central,
        ..LmConfig::default()
    };
    let result = fit_deuteron(&freqs, &signal, perturbed_start(), &config).unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.params[ParamName::R].value(), truth.r, max_relative = 1e-6);
    assert_relative_eq!(result.params[ParamName::WL].value(), truth.wl, max_relative = 1e-9);
}

#[test]
fn test_model_parameters_hold_fitted_values() {
    let truth = broadened_values();
    let freqs = sweep(150);
    let signal = evaluate(&freqs, &truth);

    let mut model = LineshapeModel::new(perturbed_start().fix(ParamName::WL)).with_parallel(true);
    model.parameters_mut()[ParamName::WL].set_value(truth.wl).unwrap();

    let result = fit(&mut model, &freqs, &signal, &LmConfig::default()).unwrap();

    assert_eq!(model.parameters().value_vec(), result.params.value_vec());
    assert_eq!(result.var_names, vec!["A", "G", "r", "wQ", "eta", "xi"]);
    assert_eq!(result.init_values[ParamName::R.index()], 1.8);
    assert_relative_eq!(model.values().r, truth.r, max_relative = 1e-6);

    let init_chisqr: f64 = (&result.init_fit - &signal).mapv(|d| d * d).sum();
    assert!(result.chisqr < 1e-10 * init_chisqr);
}

#[test]
fn test_equal_bounds_hold_a_parameter() {
    let truth = broadened_values();
    let freqs = sweep(150);
    let signal = evaluate(&freqs, &truth);

    let mut params = perturbed_start();
    params[ParamName::WL].set_bounds(truth.wl, truth.wl).unwrap();
    assert!(params[ParamName::WL].vary());

    let result = fit_deuteron(&freqs, &signal, params, &LmConfig::default()).unwrap();

    assert!(result.success, "{}", result);
    assert_eq!(result.nvarys, 6);
    assert!(!result.var_names.contains(&"wL".to_string()));
    assert_eq!(result.params[ParamName::WL].value(), truth.wl);
    assert!(result.params[ParamName::WL].stderr().is_none());
    assert_relative_eq!(result.params[ParamName::R].value(), truth.r, max_relative = 1e-6);
}
