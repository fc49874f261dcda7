//! Measured or simulated spectra.

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{FitError, Result};
use crate::lineshape::{self, LineshapeValues};

/// A frequency axis and the signal sampled on it.
///
/// The two arrays always have the same, non-zero length.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    freqs: Array1<f64>,
    signal: Array1<f64>,
}

impl Spectrum {
    /// Pair a frequency axis with signal samples.
    ///
    /// # Errors
    ///
    /// [`FitError::DimensionMismatch`] if the lengths differ, and
    /// [`FitError::InvalidInput`] if the spectrum is empty.
    pub fn new(freqs: Array1<f64>, signal: Array1<f64>) -> Result<Self> {
        if freqs.len() != signal.len() {
            return Err(FitError::DimensionMismatch(format!(
                "{} frequencies but {} signal samples",
                freqs.len(),
                signal.len()
            )));
        }
        if freqs.is_empty() {
            return Err(FitError::InvalidInput("spectrum has no points".to_string()));
        }
        Ok(Self { freqs, signal })
    }

    /// Sample the lineshape on `freqs` and add Gaussian noise with standard
    /// deviation `noise_sigma`. A zero sigma gives the exact model.
    ///
    /// ```
    /// use deuteron_fit::lineshape::LineshapeValues;
    /// use deuteron_fit::Spectrum;
    /// use ndarray::Array1;
    ///
    /// let p = LineshapeValues { a: 0.05, g: 1.0, r: 1.5, wq: 0.027, wl: 32.69, eta: 0.1, xi: 0.0 };
    /// let freqs = Array1::linspace(32.5, 32.9, 200);
    /// let spectrum = Spectrum::synthetic(freqs, &p, 0.0, &mut rand::thread_rng()).unwrap();
    /// assert_eq!(spectrum.len(), 200);
    /// ```
    pub fn synthetic<R: Rng + ?Sized>(
        freqs: Array1<f64>,
        params: &LineshapeValues,
        noise_sigma: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if !(noise_sigma >= 0.0 && noise_sigma.is_finite()) {
            return Err(FitError::InvalidInput(format!(
                "noise sigma must be finite and non-negative, got {}",
                noise_sigma
            )));
        }
        let normal = Normal::new(0.0, noise_sigma).map_err(|e| {
            FitError::InvalidInput(format!("noise sigma {}: {}", noise_sigma, e))
        })?;

        let mut signal = lineshape::evaluate(&freqs, params);
        if noise_sigma > 0.0 {
            signal.mapv_inplace(|y| y + normal.sample(rng));
        }
        Self::new(freqs, signal)
    }

    pub fn freqs(&self) -> &Array1<f64> {
        &self.freqs
    }

    pub fn signal(&self) -> &Array1<f64> {
        &self.signal
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    /// Whether the spectrum has no points.
    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// The frequency range covered, as `(min, max)`.
    pub fn range(&self) -> (f64, f64) {
        self.freqs
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &w| {
                (lo.min(w), hi.max(w))
            })
    }

    /// Split into the frequency and signal arrays.
    pub fn into_parts(self) -> (Array1<f64>, Array1<f64>) {
        (self.freqs, self.signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn values() -> LineshapeValues {
        LineshapeValues {
            a: 0.05,
            g: 1.0,
            r: 1.5,
            wq: 0.027,
            wl: 32.69,
            eta: 0.1,
            xi: 0.0,
        }
    }

    #[test]
    fn test_length_mismatch() {
        let err = Spectrum::new(array![1.0, 2.0], array![1.0]).unwrap_err();
        assert!(matches!(err, FitError::DimensionMismatch(_)));
    }

    #[test]
    fn test_empty_spectrum() {
        let err = Spectrum::new(array![], array![]).unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)));
    }

    #[test]
    fn test_noise_free_synthetic_matches_model() {
        let freqs = Array1::linspace(32.5, 32.9, 50);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let spectrum = Spectrum::synthetic(freqs.clone(), &values(), 0.0, &mut rng).unwrap();
        assert_eq!(spectrum.signal(), &lineshape::evaluate(&freqs, &values()));
        assert_eq!(spectrum.range(), (freqs[0], freqs[49]));
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let freqs = Array1::linspace(32.5, 32.9, 50);
        let a = Spectrum::synthetic(
            freqs.clone(),
            &values(),
            0.01,
            &mut ChaCha8Rng::seed_from_u64(42),
        )
        .unwrap();
        let b = Spectrum::synthetic(freqs, &values(), 0.01, &mut ChaCha8Rng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);

        let exact = lineshape::evaluate(a.freqs(), &values());
        let rms = ((a.signal() - &exact).mapv(|d| d * d).sum() / 50.0).sqrt();
        assert!(rms > 0.002 && rms < 0.03, "rms = {rms}");
    }

    #[test]
    fn test_bad_sigma_is_rejected() {
        for sigma in [-1.0, -1e-12, f64::NAN, f64::INFINITY] {
            let freqs = Array1::linspace(32.5, 32.9, 5);
            let err =
                Spectrum::synthetic(freqs, &values(), sigma, &mut ChaCha8Rng::seed_from_u64(0))
                    .unwrap_err();
            assert!(matches!(err, FitError::InvalidInput(_)), "sigma = {sigma}");
        }
    }
}
