//! # Uncertainty Calculation
//!
//! Parameter uncertainties from the Jacobian at the solution of a
//! least-squares fit, estimated the way lmfit-py does:
//!
//! - Covariance matrix `redchi · (JᵀJ)⁻¹`
//! - Correlation matrix
//! - Standard errors from the covariance diagonal

mod covariance;

pub use covariance::{
    calculate_correlation, calculate_covariance, standard_errors_from_covariance,
};
