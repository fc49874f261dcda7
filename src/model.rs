//! Model trait and the fitting driver.
//!
//! A [`Model`] maps a set of named parameters and the independent variable to
//! predicted values. [`fit`] adapts a model and a data set to a
//! [`Problem`] in the optimizer's unbounded internal space, runs the
//! Levenberg-Marquardt optimizer, writes the fitted values back into the
//! model's parameters and estimates their uncertainties.

use ndarray::{Array1, Array2};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{FitError, Result};
use crate::lm::{ConvergenceStatus, DiffMethod, LevenbergMarquardt, LmConfig};
use crate::parameters::{BoundsTransform, ParameterSet};
use crate::problem::Problem;
use crate::uncertainty::{calculate_correlation, calculate_covariance};
use crate::utils::finite_difference;

/// A trait representing a model that can be fit to data.
pub trait Model: Send + Sync {
    /// The parameter collection the model is evaluated with.
    type Params: ParameterSet;

    /// Returns a reference to the model's parameters.
    fn parameters(&self) -> &Self::Params;

    /// Returns a mutable reference to the model's parameters.
    fn parameters_mut(&mut self) -> &mut Self::Params;

    /// Evaluate the model at `x` for explicit parameter values, given in the
    /// order of [`ParameterSet::as_slice`].
    fn eval_values(&self, values: &[f64], x: &Array1<f64>) -> Result<Array1<f64>>;

    /// Evaluates the model at the given x values using the current parameter values.
    fn eval(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.eval_values(&self.parameters().value_vec(), x)
    }

    /// Calculates the residuals (y_pred - y_obs) using the current parameter values.
    fn residuals(&self, x: &Array1<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
        let y_pred = self.eval(x)?;

        if y.len() != y_pred.len() {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} observed values, got {}",
                y_pred.len(),
                y.len()
            )));
        }

        Ok(y_pred - y)
    }
}

/// Adapts a [`Model`] and a data set to a [`Problem`].
///
/// The problem's parameter vector holds only the varying parameters, mapped
/// through their [`BoundsTransform`]s into unbounded internal space. Fixed
/// parameters keep their current values.
pub struct ModelProblem<'a, M: Model> {
    model: &'a M,
    x: &'a Array1<f64>,
    y: &'a Array1<f64>,
    values: Vec<f64>,
    varying: Vec<usize>,
    transforms: Vec<BoundsTransform>,
    warned_non_finite: AtomicBool,
}

impl<'a, M: Model> ModelProblem<'a, M> {
    /// Create a new adapter. `x` and `y` must have the same length.
    pub fn new(model: &'a M, x: &'a Array1<f64>, y: &'a Array1<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(FitError::DimensionMismatch(format!(
                "{} x values but {} y values",
                x.len(),
                y.len()
            )));
        }

        let params = model.parameters();
        let varying = params.varying_indices();
        let transforms = varying
            .iter()
            .map(|&i| params.as_slice()[i].transform())
            .collect();

        Ok(Self {
            model,
            x,
            y,
            values: params.value_vec(),
            varying,
            transforms,
            warned_non_finite: AtomicBool::new(false),
        })
    }

    /// Number of data points.
    pub fn ndata(&self) -> usize {
        self.x.len()
    }

    /// Number of varying parameters.
    pub fn nvarys(&self) -> usize {
        self.varying.len()
    }

    /// Positions of the varying parameters in the model's parameter order.
    pub fn varying_indices(&self) -> &[usize] {
        &self.varying
    }

    /// Internal-space starting point for the optimizer.
    pub fn initial_internal(&self) -> Result<Array1<f64>> {
        self.varying
            .iter()
            .zip(&self.transforms)
            .map(|(&i, t)| t.to_internal(self.values[i]).map_err(FitError::from))
            .collect()
    }

    /// All parameter values, with the varying ones taken from `internal`.
    pub fn to_external(&self, internal: &Array1<f64>) -> Vec<f64> {
        let mut values = self.values.clone();
        for ((&i, t), &v) in self.varying.iter().zip(&self.transforms).zip(internal) {
            values[i] = t.to_external(v);
        }
        values
    }

    /// Jacobian of the residuals with respect to the varying parameters in
    /// external (bounded) space, evaluated at `external`.
    pub fn external_jacobian(&self, external: &Array1<f64>) -> Result<Array2<f64>> {
        let view = ExternalView { problem: self };
        let base = view.eval(external)?;
        finite_difference::jacobian_with(&view, external, &base, DiffMethod::Central, None, false)
    }

    fn residuals_for(&self, values: &[f64]) -> Result<Array1<f64>> {
        let y_pred = self.model.eval_values(values, self.x)?;
        if y_pred.len() != self.y.len() {
            return Err(FitError::DimensionMismatch(format!(
                "model returned {} values for {} data points",
                y_pred.len(),
                self.y.len()
            )));
        }

        if y_pred.iter().any(|v| !v.is_finite())
            && !self.warned_non_finite.swap(true, Ordering::Relaxed)
        {
            log::warn!("model produced non-finite values at parameters {:?}", values);
        }

        Ok(y_pred - self.y)
    }
}

impl<'a, M: Model> Problem for ModelProblem<'a, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.residuals_for(&self.to_external(params))
    }

    fn parameter_count(&self) -> usize {
        self.varying.len()
    }

    fn residual_count(&self) -> usize {
        self.y.len()
    }
}

/// The same residuals, parametrised directly by external values.
struct ExternalView<'p, 'a, M: Model> {
    problem: &'p ModelProblem<'a, M>,
}

impl<'p, 'a, M: Model> Problem for ExternalView<'p, 'a, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let mut values = self.problem.values.clone();
        for (&i, &v) in self.problem.varying.iter().zip(params) {
            values[i] = v;
        }
        self.problem.residuals_for(&values)
    }

    fn parameter_count(&self) -> usize {
        self.problem.varying.len()
    }

    fn residual_count(&self) -> usize {
        self.problem.y.len()
    }
}

/// Result of fitting a model to data.
#[derive(Debug, Clone)]
pub struct FitResult<P> {
    /// Parameters at the solution, with standard errors
    pub params: P,

    /// Parameter values the fit started from, in model order
    pub init_values: Vec<f64>,

    /// Model evaluated at the solution
    pub best_fit: Array1<f64>,

    /// Model evaluated at the starting values
    pub init_fit: Array1<f64>,

    /// Residuals (model - data) at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub chisqr: f64,

    /// `chisqr / nfree`
    pub redchi: f64,

    /// Akaike information criterion
    pub aic: f64,

    /// Bayesian information criterion
    pub bic: f64,

    /// Number of data points
    pub ndata: usize,

    /// Number of varying parameters
    pub nvarys: usize,

    /// Degrees of freedom, `ndata - nvarys`
    pub nfree: usize,

    /// Number of residual evaluations
    pub nfev: usize,

    /// Number of accepted optimizer steps
    pub iterations: usize,

    /// Why the optimizer stopped
    pub status: ConvergenceStatus,

    /// Whether the fit converged
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// Covariance of the varying parameters, if it could be estimated
    pub covariance: Option<Array2<f64>>,

    /// Correlation of the varying parameters
    pub correlation: Option<Array2<f64>>,

    /// Names of the varying parameters, in covariance order
    pub var_names: Vec<String>,
}

impl<P: ParameterSet> FitResult<P> {
    /// Fitted value of the named parameter.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.params.get(name).map(|p| p.value())
    }

    /// Standard error of the named parameter, if it varied and the
    /// covariance could be estimated.
    pub fn stderr(&self, name: &str) -> Option<f64> {
        self.params.get(name).and_then(|p| p.stderr())
    }
}

impl<P: ParameterSet> fmt::Display for FitResult<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[[Fit Statistics]]")?;
        writeln!(f, "    # fitting method   = leastsq")?;
        writeln!(f, "    # function evals   = {}", self.nfev)?;
        writeln!(f, "    # data points      = {}", self.ndata)?;
        writeln!(f, "    # variables        = {}", self.nvarys)?;
        writeln!(f, "    chi-square         = {:.8e}", self.chisqr)?;
        writeln!(f, "    reduced chi-square = {:.8e}", self.redchi)?;
        writeln!(f, "    Akaike info crit   = {:.5}", self.aic)?;
        writeln!(f, "    Bayesian info crit = {:.5}", self.bic)?;
        writeln!(f, "    status             = {}", self.status)?;

        writeln!(f, "[[Variables]]")?;
        let width = self
            .params
            .names()
            .iter()
            .map(|n| n.len())
            .max()
            .unwrap_or(0);
        for (param, init) in self.params.as_slice().iter().zip(&self.init_values) {
            let label = format!("{}:", param.name());
            write!(f, "    {:<w$} {:.8}", label, param.value(), w = width + 1)?;
            if !param.is_free() {
                writeln!(f, " (fixed)")?;
                continue;
            }
            match param.stderr() {
                Some(err) if param.value() != 0.0 => write!(
                    f,
                    " +/- {:.8} ({:.2}%)",
                    err,
                    (err / param.value()).abs() * 100.0
                )?,
                Some(err) => write!(f, " +/- {:.8}", err)?,
                None => {}
            }
            writeln!(f, " (init = {})", init)?;
        }

        if let Some(correl) = &self.correlation {
            let mut pairs = Vec::new();
            for i in 0..self.var_names.len() {
                for j in (i + 1)..self.var_names.len() {
                    if correl[[i, j]].abs() >= 0.1 {
                        pairs.push((i, j, correl[[i, j]]));
                    }
                }
            }
            if !pairs.is_empty() {
                pairs.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
                writeln!(f, "[[Correlations]] (unreported correlations are < 0.100)")?;
                for (i, j) in pairs.iter().map(|&(i, j, _)| (i, j)) {
                    writeln!(
                        f,
                        "    C({}, {}) = {:+.4}",
                        self.var_names[i], self.var_names[j], correl[[i, j]]
                    )?;
                }
            }
        }
        Ok(())
    }
}

/// Fit a model to data by least squares.
///
/// On return the model's parameters hold the fitted values and standard
/// errors, and the same parameters are returned in the [`FitResult`].
/// Non-convergence is reported through [`FitResult::success`], not as an
/// error.
///
/// # Errors
///
/// - [`FitError::DimensionMismatch`] if `x` and `y` differ in length
/// - [`FitError::InvalidInput`] if nothing varies or there are no more data
///   points than varying parameters
/// - [`FitError::FunctionEvaluation`] if the model is not finite at the
///   starting values
pub fn fit<M: Model>(
    model: &mut M,
    x: &Array1<f64>,
    y: &Array1<f64>,
    config: &LmConfig,
) -> Result<FitResult<M::Params>> {
    let problem = ModelProblem::new(&*model, x, y)?;
    let ndata = problem.ndata();
    let nvarys = problem.nvarys();

    if nvarys == 0 {
        return Err(FitError::InvalidInput(
            "no parameters are allowed to vary".to_string(),
        ));
    }
    if ndata <= nvarys {
        return Err(FitError::InvalidInput(format!(
            "{} data points cannot determine {} varying parameters",
            ndata, nvarys
        )));
    }

    for &i in problem.varying_indices() {
        let param = &model.parameters().as_slice()[i];
        if param.is_at_bound() {
            log::warn!(
                "parameter {} starts on its bound at {} and will stay there",
                param.name(),
                param.value()
            );
        }
    }

    let init_values = model.parameters().value_vec();
    let init_fit = model.eval(x)?;

    let initial = problem.initial_internal()?;
    let result = LevenbergMarquardt::with_config(config.clone()).minimize(&problem, initial)?;
    let values = problem.to_external(&result.params);

    let external = Array1::from_iter(problem.varying_indices().iter().map(|&i| values[i]));
    let varying = problem.varying_indices().to_vec();
    let best_fit = model.eval_values(&values, x)?;
    let residuals = &best_fit - y;
    let chisqr: f64 = residuals.iter().map(|r| r * r).sum();
    let nfree = ndata - nvarys;
    let redchi = chisqr / nfree as f64;

    let covariance = match problem
        .external_jacobian(&external)
        .and_then(|jac| calculate_covariance(&jac, redchi))
    {
        Ok(covar) => Some(covar),
        Err(FitError::SingularMatrix) => {
            log::warn!("could not estimate uncertainties: JᵀJ is singular at the solution");
            None
        }
        Err(e) => return Err(e),
    };
    let nfev = result.func_evals;
    drop(problem);

    let params = model.parameters_mut();
    for (param, &value) in params.as_mut_slice().iter_mut().zip(&values) {
        param.set_value(value)?;
        param.set_stderr(None);
    }
    if let Some(covar) = &covariance {
        for (k, &i) in varying.iter().enumerate() {
            let var = covar[[k, k]];
            params.as_mut_slice()[i].set_stderr((var >= 0.0).then(|| var.sqrt()));
        }
    }

    let var_names = varying
        .iter()
        .map(|&i| params.as_slice()[i].name().to_string())
        .collect();

    // lmfit floors chi-square so a perfect fit still has finite criteria
    let n = ndata as f64;
    let log_like = n * (chisqr.max(1e-250) / n).ln();
    let aic = log_like + 2.0 * nvarys as f64;
    let bic = log_like + n.ln() * nvarys as f64;

    log::info!(
        "fit finished after {} iterations ({} evaluations): {}, chi-square = {:.6e}",
        result.iterations,
        nfev,
        result.status,
        chisqr
    );

    Ok(FitResult {
        params: params.clone(),
        init_values,
        best_fit,
        init_fit,
        residuals,
        chisqr,
        redchi,
        aic,
        bic,
        ndata,
        nvarys,
        nfree,
        nfev,
        iterations: result.iterations,
        status: result.status,
        success: result.success,
        message: result.message,
        correlation: covariance.as_ref().map(calculate_correlation),
        covariance,
        var_names,
    })
}
