//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! Each iteration solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ D) δ = -Jᵀ r,    D = diag(JᵀJ)
//! ```
//!
//! by Cholesky factorisation. A step that lowers the cost is accepted and the
//! damping relaxed; otherwise the damping is raised and the step recomputed
//! from the same Jacobian.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{FitError, Result};
use crate::problem::Problem;
use crate::utils::finite_difference;
use crate::utils::matrix_convert::{ndarray_to_nalgebra, ndarray_vec_to_nalgebra};

use super::config::{DiffMethod, LmConfig};
use super::convergence::{gradient_cosine, step_is_small, ConvergenceStatus};

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted steps
    pub iterations: usize,

    /// Number of residual evaluations, including those for Jacobians
    pub func_evals: usize,

    /// Why the iteration stopped
    pub status: ConvergenceStatus,

    /// Whether the optimization converged
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {}", self.params)?;
        Ok(())
    }
}

/// Outcome of trying steps from one Jacobian.
enum StepOutcome {
    Accepted,
    Stop(ConvergenceStatus, String),
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for the relative cost reduction.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for the relative parameter change.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for the gradient cosine.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the method used for calculating the Jacobian.
    pub fn with_differentiation_method(mut self, method: DiffMethod) -> Self {
        self.config.diff_method = method;
        self
    }

    /// Evaluate Jacobian columns in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Set whether to calculate and return the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Non-finite residuals at a trial point simply reject that step, but
    /// the residuals at `initial_params` must be finite.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    pub fn minimize<P: Problem + Sync + ?Sized>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;

        if residuals.len() != problem.residual_count() {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} residuals, got {}",
                problem.residual_count(),
                residuals.len()
            )));
        }

        let mut cost = sum_of_squares(&residuals);
        if !cost.is_finite() {
            return Err(FitError::FunctionEvaluation(
                "residuals are not finite at the initial parameters".to_string(),
            ));
        }

        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;

        let (status, message) = loop {
            if cost == 0.0 {
                break (
                    ConvergenceStatus::FunctionValueConvergence,
                    "Cost is exactly zero".to_string(),
                );
            }

            if iterations >= self.config.max_iterations {
                break (
                    ConvergenceStatus::MaxIterationsReached,
                    format!("Maximum iterations ({}) reached", self.config.max_iterations),
                );
            }

            let jac = self.jacobian(problem, &params, &residuals)?;
            func_evals += self.jacobian_evaluations(problem, n_params);

            if jac.iter().any(|v| !v.is_finite()) {
                break (
                    ConvergenceStatus::NumericalError,
                    "Jacobian contains non-finite entries".to_string(),
                );
            }

            let j = ndarray_to_nalgebra(&jac);
            let r = ndarray_vec_to_nalgebra(&residuals);
            let jtj = j.transpose() * &j;
            let jtr = j.transpose() * &r;

            let column_norms: Vec<f64> = j.column_iter().map(|c| c.norm()).collect();
            let cosine = gradient_cosine(jtr.as_slice(), &column_norms, r.norm());
            if cosine <= self.config.gtol {
                break (
                    ConvergenceStatus::GradientConvergence,
                    format!(
                        "Gradient convergence: max cos = {:.2e} <= {:.2e}",
                        cosine, self.config.gtol
                    ),
                );
            }

            let outcome = self.try_steps(
                problem,
                &jtj,
                &jtr,
                &mut params,
                &mut residuals,
                &mut cost,
                &mut lambda,
                &mut func_evals,
            );

            match outcome {
                StepOutcome::Accepted => {
                    iterations += 1;
                    log::debug!(
                        "iteration {}: cost = {:.6e}, lambda = {:.1e}",
                        iterations,
                        cost,
                        lambda
                    );
                }
                StepOutcome::Stop(status, message) => {
                    if status == ConvergenceStatus::FunctionValueConvergence {
                        iterations += 1;
                    }
                    break (status, message);
                }
            }
        };

        let jacobian = if self.config.calc_jacobian {
            Some(self.jacobian(problem, &params, &residuals)?)
        } else {
            None
        };

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success: status.is_converged(),
            status,
            message,
            jacobian,
        })
    }

    /// Search for a downhill step from the current Jacobian, raising the
    /// damping after every rejected trial.
    #[allow(clippy::too_many_arguments)]
    fn try_steps<P: Problem + Sync + ?Sized>(
        &self,
        problem: &P,
        jtj: &DMatrix<f64>,
        jtr: &DVector<f64>,
        params: &mut Array1<f64>,
        residuals: &mut Array1<f64>,
        cost: &mut f64,
        lambda: &mut f64,
        func_evals: &mut usize,
    ) -> StepOutcome {
        let n = jtj.nrows();
        let max_diag = (0..n).map(|i| jtj[(i, i)]).fold(0.0, f64::max);
        let diag_floor = f64::EPSILON * max_diag;

        loop {
            let mut damped = jtj.clone();
            for i in 0..n {
                damped[(i, i)] += *lambda * jtj[(i, i)].max(diag_floor);
            }

            let step = damped.cholesky().map(|chol| chol.solve(&(-jtr)));
            let Some(step) = step else {
                if !self.raise_damping(lambda) {
                    return StepOutcome::Stop(
                        ConvergenceStatus::NumericalError,
                        "Damped normal equations are not positive definite".to_string(),
                    );
                }
                continue;
            };

            let small = step_is_small(step.as_slice(), &params.to_vec(), self.config.xtol);

            let trial = &*params + &Array1::from_iter(step.iter().copied());
            *func_evals += 1;
            let trial_residuals = match problem.eval(&trial) {
                Ok(r) => r,
                Err(e) => {
                    log::trace!("trial step rejected: {e}");
                    Array1::from_elem(residuals.len(), f64::NAN)
                }
            };
            let trial_cost = sum_of_squares(&trial_residuals);

            if trial_cost.is_finite() && trial_cost < *cost {
                let reduction = (*cost - trial_cost) / *cost;

                *params = trial;
                *residuals = trial_residuals;
                *cost = trial_cost;
                *lambda = (*lambda * self.config.lambda_down_factor).max(self.config.min_lambda);

                if trial_cost == 0.0 || reduction < self.config.ftol {
                    return StepOutcome::Stop(
                        ConvergenceStatus::FunctionValueConvergence,
                        format!(
                            "Cost convergence: |df|/f = {:.2e} < {:.2e}",
                            reduction, self.config.ftol
                        ),
                    );
                }
                if small {
                    return StepOutcome::Stop(
                        ConvergenceStatus::ParameterConvergence,
                        format!("Parameter convergence: |dx| <= {:.2e} |x|", self.config.xtol),
                    );
                }
                return StepOutcome::Accepted;
            }

            log::trace!(
                "step rejected: trial cost {:.6e} >= {:.6e} at lambda {:.1e}",
                trial_cost,
                cost,
                lambda
            );

            if small {
                return StepOutcome::Stop(
                    ConvergenceStatus::ParameterConvergence,
                    format!("Parameter convergence: |dx| <= {:.2e} |x|", self.config.xtol),
                );
            }

            if !self.raise_damping(lambda) {
                return StepOutcome::Stop(
                    ConvergenceStatus::DampingLimitReached,
                    "Failed to decrease cost, and lambda reached maximum".to_string(),
                );
            }
        }
    }

    /// Multiply lambda up; false once it would pass the maximum.
    fn raise_damping(&self, lambda: &mut f64) -> bool {
        *lambda *= self.config.lambda_up_factor;
        *lambda <= self.config.max_lambda
    }

    fn jacobian<P: Problem + Sync + ?Sized>(
        &self,
        problem: &P,
        params: &Array1<f64>,
        residuals: &Array1<f64>,
    ) -> Result<Array2<f64>> {
        if problem.has_custom_jacobian() {
            problem.jacobian(params)
        } else {
            finite_difference::jacobian_with(
                problem,
                params,
                residuals,
                self.config.diff_method,
                self.config.diff_step,
                self.config.parallel,
            )
        }
    }

    fn jacobian_evaluations<P: Problem + ?Sized>(&self, problem: &P, n_params: usize) -> usize {
        if problem.has_custom_jacobian() {
            0
        } else {
            finite_difference::evaluations_per_jacobian(n_params, self.config.diff_method)
        }
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}
