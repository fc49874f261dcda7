//! Problem definition trait.
//!
//! A [`Problem`] is a nonlinear least-squares problem as the
//! Levenberg-Marquardt optimizer sees it: a residual vector as a function of
//! an unconstrained parameter vector. Anything that can be phrased this way
//! can be minimized, and the lineshape fit is just one such problem.

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A trait representing a nonlinear least squares problem.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix `J[i, j] = ∂residual[i]/∂param[j]`.
    ///
    /// The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Whether [`jacobian`](Problem::jacobian) is analytic.
    ///
    /// When this is false the optimizer builds the Jacobian itself, using the
    /// difference scheme and parallelism from its configuration.
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}
