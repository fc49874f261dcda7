//! Relative intensities of the two spin-1 transitions.
//!
//! `r` is the asymmetry ratio, `q = wQ / wL`, and `reduced` is the reduced
//! frequency offset `R = (w - wL) / (3 wQ)`. At `r = 1` both vanish.

/// Intensity of the `+` transition.
pub fn plus(r: f64, q: f64, reduced: f64) -> f64 {
    let s = r.powf(-3.0 * q * reduced);
    let norm = r * (r + s) + 1.0;
    r * (r - s) / norm
}

/// Intensity of the `-` transition.
pub fn minus(r: f64, q: f64, reduced: f64) -> f64 {
    let s = r.powf(3.0 * q * reduced);
    let norm = r * (r + s) + 1.0;
    (r * s - 1.0) / norm
}
