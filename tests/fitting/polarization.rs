//! Recovering the polarization of a noisy, 42 %-polarized spectrum.

use deuteron_fit::{
    asymmetry_for_polarization, fit_spectrum, polarization, LineshapeParams, LineshapeValues,
    LmConfig, ParamName, Spectrum,
};
use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::test_helpers::{example_values, init_logging};

const POLARIZATION: f64 = 0.42;

fn polarized_spectrum(seed: u64) -> Spectrum {
    let truth = LineshapeValues {
        r: asymmetry_for_polarization(POLARIZATION),
        ..example_values()
    };
    let freqs = Array1::linspace(32.5, 32.88, 400);
    // about 0.2 % of the peak height
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Spectrum::synthetic(freqs, &truth, 5e-6, &mut rng).unwrap()
}

fn initial_params() -> LineshapeParams {
    LineshapeParams::from_values([
        ("A", 0.03),
        ("G", -0.00003),
        ("r", 1.2),
        ("wQ", 0.027),
        ("wL", 32.69),
        ("eta", -0.02),
        ("xi", -0.001),
    ])
    .unwrap()
    .with_physical_bounds()
    .unwrap()
    .fix(ParamName::Eta)
}

#[test]
fn test_asymmetry_for_target_polarization() {
    let r = asymmetry_for_polarization(POLARIZATION);
    assert!((r - 1.96811).abs() < 1e-5, "r = {}", r);
    assert!((polarization(r) - POLARIZATION).abs() < 1e-12);
}

#[test]
fn test_recovers_polarization() {
    init_logging();
    let spectrum = polarized_spectrum(42);

    let result = fit_spectrum(&spectrum, initial_params(), &LmConfig::default()).unwrap();

    assert!(result.success, "{}", result);
    let pol = result.polarization();
    assert!(
        (pol - POLARIZATION).abs() < 0.02,
        "fitted polarization {:.4} from r = {:.5}",
        pol,
        result.params[ParamName::R].value()
    );

    let err = result.polarization_stderr().unwrap();
    assert!(err > 0.0 && err < 0.02, "polarization error {}", err);

    // the fixed peak-width factor is untouched and carries no error
    assert_eq!(result.params[ParamName::Eta].value(), -0.02);
    assert!(result.params[ParamName::Eta].stderr().is_none());
    assert_eq!(result.nvarys, 6);
}

#[test]
fn test_recovery_holds_across_noise_realisations() {
    for seed in [1, 2, 3] {
        let result =
            fit_spectrum(&polarized_spectrum(seed), initial_params(), &LmConfig::default())
                .unwrap();
        assert!(
            (result.polarization() - POLARIZATION).abs() < 0.02,
            "seed {}: {}",
            seed,
            result
        );
    }
}

#[test]
fn test_parallel_paths_agree() {
    let spectrum = polarized_spectrum(42);
    let serial = fit_spectrum(&spectrum, initial_params(), &LmConfig::default()).unwrap();

    let config = LmConfig {
        parallel: true,
        ..LmConfig::default()
    };
    let parallel = fit_spectrum(&spectrum, initial_params(), &config).unwrap();

    assert_eq!(serial.values(), parallel.values());
    assert_eq!(serial.nfev, parallel.nfev);
}
