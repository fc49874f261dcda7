//! # deuteron-fit
//!
//! `deuteron-fit` fits the spin-1 (deuteron) NMR lineshape, the
//! quadrupole-split "Pake doublet", to measured spectra and reports the
//! fitted physical parameters and the vector polarization they imply.
//!
//! The library provides:
//! - The closed-form lineshape evaluator ([`lineshape`])
//! - A strongly typed parameter set with bounds and vary flags, similar to
//!   lmfit-py ([`parameters`])
//! - A Levenberg-Marquardt optimizer behind the [`Problem`] and [`Model`]
//!   traits ([`lm`], [`model`])
//! - Covariance-based uncertainties and fit statistics ([`FitResult`])
//! - JSON fit configurations ([`FitConfig`])
//!
//! ## Basic Usage
//!
//! ```
//! use deuteron_fit::{fit_deuteron, lineshape, LineshapeParams, LmConfig, ParamName};
//! use ndarray::Array1;
//!
//! # let truth = lineshape::LineshapeValues {
//! #     a: 0.03, g: -3e-5, r: 1.6, wq: 0.027, wl: 32.69, eta: -0.02, xi: -0.001,
//! # };
//! # let freqs = Array1::linspace(32.5, 32.88, 300);
//! # let signal = lineshape::evaluate(&freqs, &truth);
//! let params = LineshapeParams::from_values([
//!     ("A", 0.03), ("G", -0.00003), ("r", 1.2), ("wQ", 0.027),
//!     ("wL", 32.69), ("eta", -0.02), ("xi", -0.001),
//! ])?
//! .with_physical_bounds()?
//! .fix(ParamName::Eta);
//!
//! let result = fit_deuteron(&freqs, &signal, params, &LmConfig::default())?;
//! println!("{}", result);
//! println!("polarization = {:.2}%", 100.0 * result.polarization());
//! # assert!((result.params[ParamName::R].value() - 1.6).abs() < 1e-6);
//! # Ok::<(), deuteron_fit::FitError>(())
//! ```

pub mod config;
pub mod error;
pub mod lineshape;
pub mod lm;
pub mod model;
pub mod models;
pub mod parameters;
pub mod problem;
pub mod spectrum;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use config::FitConfig;
pub use error::{FitError, Result};
pub use lineshape::{asymmetry_for_polarization, polarization, LineshapeValues};
pub use lm::{ConvergenceStatus, DiffMethod, LevenbergMarquardt, LmConfig, LmResult};
pub use model::{fit, FitResult, Model};
pub use models::{fit_deuteron, fit_spectrum, LineshapeModel};
pub use parameters::{LineshapeParams, ParamName, Parameter, ParameterSet};
pub use problem::Problem;
pub use spectrum::Spectrum;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
