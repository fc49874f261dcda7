//! Configuration options for the Levenberg-Marquardt algorithm.

use serde::{Deserialize, Serialize};

/// Finite difference scheme used when the problem has no analytic Jacobian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMethod {
    /// One extra residual evaluation per parameter
    #[default]
    Forward,

    /// Two extra residual evaluations per parameter, second-order accurate
    Central,
}

/// Configuration options for the Levenberg-Marquardt algorithm.
///
/// Every field has a default, so a config file only needs to name the
/// settings it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum number of accepted steps. Default: 200
    pub max_iterations: usize,

    /// Tolerance for the relative reduction of the cost. Default: 1e-10
    pub ftol: f64,

    /// Tolerance for the relative change of each parameter. Default: 1e-10
    pub xtol: f64,

    /// Tolerance for the cosine between residuals and Jacobian columns. Default: 1e-10
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e12
    pub max_lambda: f64,

    /// Difference scheme for the Jacobian. Default: Forward
    pub diff_method: DiffMethod,

    /// Relative finite-difference step; `None` picks one for `diff_method`.
    pub diff_step: Option<f64>,

    /// Evaluate Jacobian columns on the rayon thread pool. Default: false
    pub parallel: bool,

    /// Whether to return the Jacobian at the solution. Default: false
    pub calc_jacobian: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            diff_method: DiffMethod::default(),
            diff_step: None,
            parallel: false,
            calc_jacobian: false,
        }
    }
}
