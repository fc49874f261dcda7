//! Finite difference Jacobians.
//!
//! Step sizes are relative to the parameter magnitude, with an absolute floor
//! for parameters at or near zero.

use crate::error::{FitError, Result};
use crate::lm::DiffMethod;
use crate::problem::Problem;
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// Default relative step for forward differences, `sqrt(f64::EPSILON)`.
pub const FORWARD_EPSILON: f64 = 1.490_116_119_384_765_6e-8;

/// Default relative step for central differences, `cbrt(f64::EPSILON)`.
pub const CENTRAL_EPSILON: f64 = 6.055_454_452_393_343e-6;

fn step_size(value: f64, eps: f64) -> f64 {
    if value.abs() > eps {
        value.abs() * eps
    } else {
        eps
    }
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The relative step size (optional)
pub fn jacobian<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let base = checked_eval(problem, params)?;
    let eps = epsilon.unwrap_or(FORWARD_EPSILON);

    let columns = (0..params.len())
        .map(|j| column(problem, params, &base, j, DiffMethod::Forward, eps))
        .collect::<Result<Vec<_>>>()?;

    Ok(assemble(base.len(), columns))
}

/// Compute the Jacobian with the given difference scheme, optionally
/// evaluating the columns in parallel.
///
/// `base` are the residuals at `params`, which the caller usually has already.
pub fn jacobian_with<P: Problem + Sync + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    base: &Array1<f64>,
    method: DiffMethod,
    epsilon: Option<f64>,
    parallel: bool,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(match method {
        DiffMethod::Forward => FORWARD_EPSILON,
        DiffMethod::Central => CENTRAL_EPSILON,
    });

    let columns = if parallel {
        (0..params.len())
            .into_par_iter()
            .map(|j| column(problem, params, base, j, method, eps))
            .collect::<Result<Vec<_>>>()?
    } else {
        (0..params.len())
            .map(|j| column(problem, params, base, j, method, eps))
            .collect::<Result<Vec<_>>>()?
    };

    Ok(assemble(base.len(), columns))
}

/// Number of residual evaluations one Jacobian costs.
pub fn evaluations_per_jacobian(n_params: usize, method: DiffMethod) -> usize {
    match method {
        DiffMethod::Forward => n_params,
        DiffMethod::Central => 2 * n_params,
    }
}

fn column<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    base: &Array1<f64>,
    j: usize,
    method: DiffMethod,
    eps: f64,
) -> Result<Array1<f64>> {
    let h = step_size(params[j], eps);

    let mut forward = params.clone();
    forward[j] += h;
    let r_forward = checked_eval(problem, &forward)?;

    match method {
        DiffMethod::Forward => Ok((r_forward - base) / h),
        DiffMethod::Central => {
            let mut backward = params.clone();
            backward[j] -= h;
            let r_backward = checked_eval(problem, &backward)?;
            Ok((r_forward - r_backward) / (2.0 * h))
        }
    }
}

fn checked_eval<P: Problem + ?Sized>(problem: &P, params: &Array1<f64>) -> Result<Array1<f64>> {
    let residuals = problem.eval(params)?;
    if residuals.len() != problem.residual_count() {
        return Err(FitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            problem.residual_count(),
            residuals.len()
        )));
    }
    Ok(residuals)
}

fn assemble(n_residuals: usize, columns: Vec<Array1<f64>>) -> Array2<f64> {
    let mut jac = Array2::zeros((n_residuals, columns.len()));
    for (j, col) in columns.into_iter().enumerate() {
        jac.column_mut(j).assign(&col);
    }
    jac
}
