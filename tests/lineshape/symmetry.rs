//! Mirror symmetry between the two transitions.

use approx::assert_relative_eq;
use deuteron_fit::lineshape::evaluate;
use deuteron_fit::LineshapeValues;
use ndarray::Array1;

#[test]
fn test_unpolarized_lineshape_is_symmetric_about_larmor() {
    // r -> 1 and wQ / wL -> 0
    let p = LineshapeValues {
        a: 0.03,
        g: 1.0,
        r: 1.0 + 1e-6,
        wq: 0.027,
        wl: 1.0e4,
        eta: 0.05,
        xi: 0.0,
    };
    let offsets = Array1::from_vec(vec![0.005, 0.02, 0.04, 0.06, 0.1]);
    let above = evaluate(&offsets.mapv(|d| p.wl + d), &p);
    let below = evaluate(&offsets.mapv(|d| p.wl - d), &p);

    for i in 0..offsets.len() {
        assert_relative_eq!(above[i], below[i], max_relative = 1e-4);
    }
}

#[test]
fn test_polarization_sign_follows_asymmetry() {
    let freqs = Array1::linspace(32.5, 32.88, 200);
    let base = LineshapeValues {
        a: 0.03,
        g: 1.0,
        r: 1.0,
        wq: 0.027,
        wl: 32.69,
        eta: 0.05,
        xi: 0.0,
    };

    // with r > 1 the plus transition carries more intensity than with r < 1
    let positive = evaluate(&freqs, &LineshapeValues { r: 1.5, ..base });
    let negative = evaluate(&freqs, &LineshapeValues { r: 1.0 / 1.5, ..base });
    assert!(positive.sum() > 0.0);
    assert!(negative.sum() < 0.0);
}
