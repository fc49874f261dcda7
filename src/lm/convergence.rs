//! Termination states of the Levenberg-Marquardt iteration.

use std::fmt;

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The step became small relative to the parameters.
    ParameterConvergence,

    /// The relative cost reduction fell below `ftol`, or the cost reached zero.
    FunctionValueConvergence,

    /// The residuals are orthogonal to every Jacobian column.
    GradientConvergence,

    /// The maximum number of iterations was reached.
    MaxIterationsReached,

    /// Damping hit its upper limit without finding a downhill step.
    DampingLimitReached,

    /// The Jacobian or the damped normal equations were not usable.
    NumericalError,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => "Converged: small cost change",
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
            ConvergenceStatus::DampingLimitReached => {
                "Terminated: damping limit reached without decreasing the cost"
            }
            ConvergenceStatus::NumericalError => "Terminated: numerical error",
        }
    }
}

impl fmt::Display for ConvergenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Largest cosine between the residual vector and any Jacobian column,
/// `max_j |J_jᵀ r| / (|J_j| |r|)`. Columns with zero norm are skipped.
pub(crate) fn gradient_cosine(jtr: &[f64], column_norms: &[f64], residual_norm: f64) -> f64 {
    if residual_norm == 0.0 {
        return 0.0;
    }

    jtr.iter()
        .zip(column_norms)
        .filter(|(_, norm)| **norm > 0.0)
        .map(|(g, norm)| (g / (norm * residual_norm)).abs())
        .fold(0.0, f64::max)
}

/// True if every `|step_i| <= xtol * (|x_i| + xtol)`.
pub(crate) fn step_is_small(step: &[f64], params: &[f64], xtol: f64) -> bool {
    step.iter()
        .zip(params)
        .all(|(dx, x)| dx.abs() <= xtol * (x.abs() + xtol))
}
