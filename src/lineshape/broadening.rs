//! Dipolar broadening of the powder-pattern lines.
//!
//! Each line of the doublet is a spin-1 powder pattern convolved with a
//! Lorentzian-like dipolar kernel of width `A`. The convolution has a closed
//! form in terms of a logarithm and an arctangent (Dulya et al., NIM A 398
//! (1997) 109). For a non-zero `eta` the result is additionally averaged over
//! the azimuthal angle with a refined trapezoid rule.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};

/// Below this `eta` the azimuthal average is skipped entirely.
///
/// Negative values fall in the same branch, so `eta` has no effect there.
pub const ETA_THRESHOLD: f64 = 0.001;

/// The trapezoid rule is refined up to 2^5 = 32 panels.
const REFINEMENT_ORDER: u32 = 5;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Which line of the doublet is being broadened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Minus,
    Plus,
}

impl Branch {
    fn sign(self) -> f64 {
        match self {
            Branch::Minus => -1.0,
            Branch::Plus => 1.0,
        }
    }
}

/// Broadened line shape `F(R)` for one branch, before the `1 / wQ` scaling.
///
/// `reduced` is `R = (w - wL) / (3 wQ)`. The two branches are mirror images:
/// `broadening(R, A, Minus, eta) == broadening(-R, A, Plus, eta)`.
pub fn broadening(reduced: f64, a: f64, branch: Branch, eta: f64) -> f64 {
    let sign = branch.sign();

    if eta < ETA_THRESHOLD {
        return slice(reduced, a, sign, 3.0, 0.0);
    }

    // endpoints cos2φ = ±1 carry half weight and no shift
    let mut sum = 0.0;
    for cos_2phi in [1.0, -1.0] {
        let y2 = 3.0 - eta * cos_2phi;
        sum += 0.5 * SQRT_3 / y2.sqrt() * slice(reduced, a, sign, y2, 0.0);
    }

    let mut dphi = 1.0;
    for level in 2..=REFINEMENT_ORDER {
        let panels = 1u32 << level;
        dphi = 1.0 / panels as f64;

        for i in (1..panels).rev().step_by(2) {
            let cos_2phi = (PI * dphi * i as f64).cos();
            let shift = eta * cos_2phi;
            let y2 = 3.0 - shift;
            sum += SQRT_3 / y2.sqrt() * slice(reduced, a, sign, y2, shift);
        }
    }

    dphi * sum
}

/// `A` times the first broadening integral for a single azimuthal slice.
///
/// `A` cancels between the integral's normalisation and the prefactor, so it
/// is never divided out and `A = 0` does not produce `0 * inf`.
fn slice(reduced: f64, a: f64, sign: f64, y2: f64, shift: f64) -> f64 {
    let y = y2.sqrt();
    let z = 1.0 - sign * reduced - shift;
    let q4 = z * z + a * a;
    let q2 = q4.sqrt();
    let qq = q2.sqrt();

    let cos_alpha = (z / q2).clamp(-1.0, 1.0);
    let cos_half = FRAC_1_SQRT_2 * (1.0 + cos_alpha).sqrt();
    let sin_half = FRAC_1_SQRT_2 * (1.0 - cos_alpha).sqrt();

    let t = y2 + q2;
    let v = 2.0 * y * qq * cos_half;

    // at the outer edge z = Y² with A -> 0 both terms are 0/0; their limits are 0
    let log_term = if sin_half == 0.0 || t - v <= 0.0 {
        0.0
    } else {
        0.5 * sin_half * ((t + v) / (t - v)).ln()
    };
    let gap = y2 - q2;
    let atan_arg = if gap == 0.0 {
        0.0
    } else {
        gap / (2.0 * y * qq * sin_half)
    };
    let atan_term = cos_half * (FRAC_PI_2 + atan_arg.atan());

    (atan_term + log_term) / (2.0 * qq)
}
