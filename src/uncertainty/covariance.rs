//! # Covariance Matrix Calculations
//!
//! Covariance, correlation and standard errors for the varying parameters
//! of a least-squares fit.

use ndarray::{Array1, Array2};

use crate::error::{FitError, Result};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where:
///   - J is the Jacobian matrix of the model with respect to the parameters
///   - redchi is the reduced chi-square (chi^2 / dof)
///
/// `JᵀJ` is inverted through its Cholesky factor. A matrix that is not
/// positive definite, which happens when a parameter has no influence on the
/// residuals, gives [`FitError::SingularMatrix`].
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let j = ndarray_to_nalgebra(jacobian);
    let jtj = j.transpose() * &j;

    let inverse = jtj
        .cholesky()
        .ok_or(FitError::SingularMatrix)?
        .inverse();

    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(FitError::SingularMatrix);
    }

    Ok(nalgebra_to_ndarray(&(inverse * redchi)))
}

/// Calculate correlation matrix from covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    let mut correl = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correl[[i, j]] = 1.0;
            } else {
                let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
                if denom > 0.0 {
                    correl[[i, j]] = covar[[i, j]] / denom;
                }
            }
        }
    }

    correl
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements
/// of the covariance matrix.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar.diag().mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
