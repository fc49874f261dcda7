//! The deuteron lineshape as a fittable [`Model`].

use ndarray::Array1;

use crate::error::Result;
use crate::lineshape::{self, polarization, LineshapeValues};
use crate::lm::LmConfig;
use crate::model::{fit, FitResult, Model};
use crate::parameters::{LineshapeParams, ParamName};
use crate::spectrum::Spectrum;

/// Deuteron NMR lineshape model over the seven [`LineshapeParams`].
#[derive(Debug, Clone)]
pub struct LineshapeModel {
    params: LineshapeParams,
    parallel: bool,
}

impl LineshapeModel {
    pub fn new(params: LineshapeParams) -> Self {
        Self {
            params,
            parallel: false,
        }
    }

    /// Evaluate frequency points on the rayon thread pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Current parameter values.
    pub fn values(&self) -> LineshapeValues {
        self.params.values()
    }

    /// Minus- and plus-transition contributions at the current values.
    pub fn components(&self, freqs: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        lineshape::evaluate_components(freqs, &self.params.values())
    }

    pub fn into_params(self) -> LineshapeParams {
        self.params
    }
}

impl Model for LineshapeModel {
    type Params = LineshapeParams;

    fn parameters(&self) -> &LineshapeParams {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut LineshapeParams {
        &mut self.params
    }

    fn eval_values(&self, values: &[f64], x: &Array1<f64>) -> Result<Array1<f64>> {
        let p = LineshapeValues::from_slice(values)?;
        Ok(if self.parallel {
            lineshape::evaluate_par(x, &p)
        } else {
            lineshape::evaluate(x, &p)
        })
    }
}

/// Fit the deuteron lineshape to a measured signal.
///
/// `params` holds the starting values, bounds and vary flags; the fitted
/// parameters come back in [`FitResult::params`].
///
/// # Examples
///
/// ```
/// use deuteron_fit::{fit_deuteron, lineshape, LineshapeParams, LmConfig};
/// use ndarray::Array1;
///
/// let truth = lineshape::LineshapeValues {
///     a: 0.05, g: 1.0, r: 1.5, wq: 0.027, wl: 32.69, eta: 0.1, xi: 0.01,
/// };
/// let freqs = Array1::linspace(32.5, 32.88, 200);
/// let signal = lineshape::evaluate(&freqs, &truth);
///
/// let start = LineshapeParams::from_values([
///     ("A", 0.04), ("G", 0.8), ("r", 1.3), ("wQ", 0.028),
///     ("wL", 32.695), ("eta", 0.08), ("xi", 0.0),
/// ]).unwrap();
///
/// let result = fit_deuteron(&freqs, &signal, start, &LmConfig::default()).unwrap();
/// assert!(result.success);
/// assert!((result.polarization() - lineshape::polarization(1.5)).abs() < 1e-6);
/// ```
pub fn fit_deuteron(
    freqs: &Array1<f64>,
    signal: &Array1<f64>,
    params: LineshapeParams,
    config: &LmConfig,
) -> Result<FitResult<LineshapeParams>> {
    let mut model = LineshapeModel::new(params);
    fit(&mut model, freqs, signal, config)
}

/// [`fit_deuteron`] on a [`Spectrum`].
pub fn fit_spectrum(
    spectrum: &Spectrum,
    params: LineshapeParams,
    config: &LmConfig,
) -> Result<FitResult<LineshapeParams>> {
    fit_deuteron(spectrum.freqs(), spectrum.signal(), params, config)
}

impl FitResult<LineshapeParams> {
    /// Fitted values of all seven parameters.
    pub fn values(&self) -> LineshapeValues {
        self.params.values()
    }

    /// Polarization implied by the fitted asymmetry `r`.
    pub fn polarization(&self) -> f64 {
        polarization(self.params[ParamName::R].value())
    }

    /// Standard error of [`polarization`](Self::polarization), propagated
    /// from the error of `r`.
    pub fn polarization_stderr(&self) -> Option<f64> {
        let r_param = &self.params[ParamName::R];
        let r = r_param.value();
        let d = r * r + r + 1.0;
        let slope = (r * r + 4.0 * r + 1.0) / (d * d);
        r_param.stderr().map(|err| slope.abs() * err)
    }
}
