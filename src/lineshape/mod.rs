//! Deuteron (spin-1) NMR lineshape.
//!
//! The predicted signal at frequency `w` combines the two transitions of the
//! quadrupole-split doublet:
//!
//! ```text
//! R   = (w - wL) / (3 wQ)
//! y   = (1 + xi (1 + R) / 2) * G * (I-(r, R) F-(R) + I+(r, R) F+(R))
//! ```
//!
//! where `I±` are the relative transition intensities set by the asymmetry
//! `r` ([`intensity`]) and `F±` are the dipolar-broadened powder patterns
//! ([`broadening`]). The formulation follows C. Dulya et al., "A line-shape
//! analysis for spin-1 NMR signals", NIM A 398 (1997) 109-125.
//!
//! Every point is computed independently from the frequency and the seven
//! parameter values; nothing is cached between calls. The formula is only
//! meaningful for `A > 0`, `wQ > 0` and `r > 0`. Outside that domain the
//! result may be NaN or infinite, and it is up to the fit bounds to keep the
//! optimizer away from it.

pub mod broadening;
pub mod intensity;

use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
pub use broadening::{broadening, Branch};

/// Plain values of the seven lineshape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineshapeValues {
    /// Dipolar broadening width
    #[serde(rename = "A")]
    pub a: f64,
    /// Amplitude scale factor
    #[serde(rename = "G")]
    pub g: f64,
    /// Asymmetry parameter; `r > 1` is positive polarization
    pub r: f64,
    /// Quadrupolar splitting, in frequency-axis units
    #[serde(rename = "wQ")]
    pub wq: f64,
    /// Larmor frequency, in frequency-axis units
    #[serde(rename = "wL")]
    pub wl: f64,
    /// Peak-width shaping factor
    pub eta: f64,
    /// Mistuning (false asymmetry) correction
    pub xi: f64,
}

impl LineshapeValues {
    /// Build from values in model order `[A, G, r, wQ, wL, eta, xi]`.
    pub fn from_array(v: [f64; 7]) -> Self {
        Self {
            a: v[0],
            g: v[1],
            r: v[2],
            wq: v[3],
            wl: v[4],
            eta: v[5],
            xi: v[6],
        }
    }

    /// Build from a slice in model order, checking its length.
    pub fn from_slice(v: &[f64]) -> Result<Self> {
        let array: [f64; 7] = v.try_into().map_err(|_| {
            FitError::DimensionMismatch(format!(
                "lineshape takes 7 parameter values, got {}",
                v.len()
            ))
        })?;
        Ok(Self::from_array(array))
    }

    /// Values in model order `[A, G, r, wQ, wL, eta, xi]`.
    pub fn to_array(&self) -> [f64; 7] {
        [self.a, self.g, self.r, self.wq, self.wl, self.eta, self.xi]
    }

    /// Polarization implied by the asymmetry `r`.
    pub fn polarization(&self) -> f64 {
        polarization(self.r)
    }

    fn reduced(&self, w: f64) -> f64 {
        (w - self.wl) / (3.0 * self.wq)
    }
}

/// Contributions of the two transitions at a single frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Components {
    pub minus: f64,
    pub plus: f64,
}

impl Components {
    pub fn total(&self) -> f64 {
        self.minus + self.plus
    }
}

/// Predicted signal at a single frequency.
pub fn eval_point(w: f64, p: &LineshapeValues) -> f64 {
    let reduced = p.reduced(w);
    let q = p.wq / p.wl;

    let i_plus = intensity::plus(p.r, q, reduced);
    let i_minus = intensity::minus(p.r, q, reduced);
    let f_minus = broadening(reduced, p.a, Branch::Minus, p.eta) / p.wq;
    let f_plus = broadening(reduced, p.a, Branch::Plus, p.eta) / p.wq;

    false_asymmetry(p, reduced) * (p.g * (i_minus * f_minus + i_plus * f_plus))
}

/// Per-transition contributions at a single frequency.
pub fn components_at(w: f64, p: &LineshapeValues) -> Components {
    let reduced = p.reduced(w);
    let q = p.wq / p.wl;
    let scale = false_asymmetry(p, reduced) * p.g;

    Components {
        minus: scale
            * intensity::minus(p.r, q, reduced)
            * (broadening(reduced, p.a, Branch::Minus, p.eta) / p.wq),
        plus: scale
            * intensity::plus(p.r, q, reduced)
            * (broadening(reduced, p.a, Branch::Plus, p.eta) / p.wq),
    }
}

/// Instrumental mistuning tilts the whole signal linearly in `R`.
fn false_asymmetry(p: &LineshapeValues, reduced: f64) -> f64 {
    1.0 + 0.5 * p.xi * (1.0 + reduced)
}

/// Predicted signal at every frequency.
///
/// # Examples
///
/// ```
/// use deuteron_fit::lineshape::{evaluate, LineshapeValues};
/// use ndarray::Array1;
///
/// let p = LineshapeValues { a: 0.03, g: 1.0, r: 1.5, wq: 0.027, wl: 32.69, eta: 0.0, xi: 0.0 };
/// let freqs = Array1::linspace(32.4, 33.0, 101);
/// let y = evaluate(&freqs, &p);
/// assert_eq!(y.len(), 101);
/// assert!(y.iter().all(|v| v.is_finite()));
/// ```
pub fn evaluate(freqs: &Array1<f64>, p: &LineshapeValues) -> Array1<f64> {
    freqs.mapv(|w| eval_point(w, p))
}

/// Same as [`evaluate`], with the frequency points split across the rayon
/// thread pool. The output is identical to the serial version.
pub fn evaluate_par(freqs: &Array1<f64>, p: &LineshapeValues) -> Array1<f64> {
    let owned;
    let points = match freqs.as_slice() {
        Some(points) => points,
        None => {
            owned = freqs.to_vec();
            &owned
        }
    };

    Array1::from_vec(points.par_iter().map(|&w| eval_point(w, p)).collect())
}

/// Minus- and plus-transition contributions at every frequency.
pub fn evaluate_components(freqs: &Array1<f64>, p: &LineshapeValues) -> (Array1<f64>, Array1<f64>) {
    let mut minus = Array1::zeros(freqs.len());
    let mut plus = Array1::zeros(freqs.len());

    for (i, &w) in freqs.iter().enumerate() {
        let c = components_at(w, p);
        minus[i] = c.minus;
        plus[i] = c.plus;
    }

    (minus, plus)
}

/// Vector polarization of the deuteron ensemble for asymmetry `r`:
/// `(r² - 1) / (r² + r + 1)`.
pub fn polarization(r: f64) -> f64 {
    (r * r - 1.0) / (r * r + r + 1.0)
}

/// Inverse of [`polarization`] on `-1 < pol < 1`, taking the positive root.
///
/// ```
/// use deuteron_fit::lineshape::{asymmetry_for_polarization, polarization};
///
/// let r = asymmetry_for_polarization(0.42);
/// assert!((polarization(r) - 0.42).abs() < 1e-12);
/// ```
pub fn asymmetry_for_polarization(pol: f64) -> f64 {
    (pol + (4.0 - 3.0 * pol * pol).sqrt()) / (2.0 * (1.0 - pol))
}
