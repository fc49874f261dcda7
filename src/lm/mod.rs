//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides a damped Gauss-Newton solver for nonlinear
//! least-squares problems described by the [`Problem`](crate::problem::Problem)
//! trait. Jacobians come from the problem itself or from finite differences.

pub mod algorithm;
pub mod config;
pub mod convergence;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DiffMethod, LmConfig};
pub use convergence::ConvergenceStatus;
