//! General properties of the lineshape: finiteness, determinism, scaling and
//! the dependence on the broadening width.

use approx::assert_relative_eq;
use deuteron_fit::lineshape::{self, broadening, evaluate, evaluate_par, Branch};
use deuteron_fit::LineshapeValues;
use ndarray::Array1;

use crate::test_helpers::{broadened_values, example_values, sweep};

#[test]
fn test_finite_over_valid_domain() {
    let freqs = Array1::linspace(32.0, 33.4, 281);

    for a in [0.005, 0.03, 0.2] {
        for eta in [-0.02, 0.05, 0.3] {
            for r in [0.5, 1.2, 3.0] {
                for wq in [0.01, 0.027] {
                    let p = LineshapeValues {
                        a,
                        r,
                        wq,
                        eta,
                        ..example_values()
                    };
                    let y = evaluate(&freqs, &p);
                    assert!(
                        y.iter().all(|v| v.is_finite()),
                        "non-finite output for {:?}",
                        p
                    );
                }
            }
        }
    }
}

#[test]
fn test_evaluation_is_deterministic() {
    let freqs = sweep(300);
    let p = example_values();

    let first = evaluate(&freqs, &p);
    let second = evaluate(&freqs, &p);
    assert_eq!(first, second);
    assert_eq!(evaluate_par(&freqs, &p), first);
}

#[test]
fn test_points_are_independent() {
    let freqs = sweep(50);
    let p = broadened_values();
    let y = evaluate(&freqs, &p);

    for (i, &w) in freqs.iter().enumerate() {
        assert_eq!(lineshape::eval_point(w, &p), y[i]);
    }
}

#[test]
fn test_doubling_g_doubles_output() {
    let freqs = sweep(120);
    let p = broadened_values();
    let doubled = LineshapeValues { g: 2.0 * p.g, ..p };

    let y = evaluate(&freqs, &p);
    let y2 = evaluate(&freqs, &doubled);
    for i in 0..freqs.len() {
        assert_relative_eq!(y2[i], 2.0 * y[i], max_relative = 1e-15);
    }
}

#[test]
fn test_unit_asymmetry_gives_zero_signal() {
    let p = LineshapeValues {
        r: 1.0,
        ..broadened_values()
    };
    assert!(evaluate(&sweep(64), &p).iter().all(|&v| v == 0.0));
    assert_eq!(p.polarization(), 0.0);
}

#[test]
fn test_small_width_limit_is_bounded() {
    // inside the doublet the powder pattern converges as A -> 0
    for reduced in [-0.5, 0.3] {
        let coarse = broadening(reduced, 1e-4, Branch::Plus, 0.0);
        let fine = broadening(reduced, 1e-6, Branch::Plus, 0.0);
        assert!(fine.is_finite());
        assert_relative_eq!(fine, coarse, max_relative = 1e-4);
    }

    // outside it the pattern vanishes with A
    for reduced in [-3.0, 1.5, 4.0] {
        let value = broadening(reduced, 1e-6, Branch::Plus, 0.0);
        assert!(value.is_finite());
        assert!(value.abs() < 1e-5, "F({}) = {}", reduced, value);
    }
}

#[test]
fn test_tiny_width_is_finite_at_the_powder_edge() {
    // 32.528 MHz sits on the outer edge of the plus line
    for a in [1e-9, 1e-12] {
        let p = LineshapeValues {
            a,
            g: 1.0,
            r: 1.5,
            wq: 0.027,
            wl: 32.69,
            eta: 0.0,
            xi: 0.0,
        };
        let value = lineshape::eval_point(32.528, &p);
        assert!(value.is_finite(), "A = {a} gave {value}");

        let edge = Array1::linspace(32.527, 32.529, 41);
        assert!(evaluate(&edge, &p).iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_large_width_broadens_and_flattens() {
    let freqs = Array1::linspace(32.4, 33.0, 600);
    let mut previous_peak = f64::INFINITY;
    let mut previous_wing = 0.0;

    for a in [0.01, 0.05, 0.2, 0.5] {
        let p = LineshapeValues {
            a,
            xi: 0.0,
            ..broadened_values()
        };
        let y = evaluate(&freqs, &p);
        let peak = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let wing = y[0];

        assert!(peak < previous_peak, "peak did not drop at A = {}", a);
        assert!(wing > previous_wing, "wing did not rise at A = {}", a);
        previous_peak = peak;
        previous_wing = wing;
    }
}

#[test]
fn test_components_sum_to_signal() {
    let freqs = sweep(80);
    let p = example_values();
    let (minus, plus) = lineshape::evaluate_components(&freqs, &p);
    let y = evaluate(&freqs, &p);

    for i in 0..freqs.len() {
        assert_relative_eq!(minus[i] + plus[i], y[i], max_relative = 1e-12, epsilon = 1e-20);
    }
}
