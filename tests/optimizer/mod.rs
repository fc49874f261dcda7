//! The Levenberg-Marquardt optimizer on plain [`Problem`]s.

use approx::assert_relative_eq;
use deuteron_fit::{ConvergenceStatus, DiffMethod, LevenbergMarquardt, LmConfig, Problem, Result};
use ndarray::{array, Array1, Array2};

/// Double exponential decay y = a1 exp(-x / t1) + a2 exp(-x / t2)
struct DoubleDecay {
    x: Array1<f64>,
    y: Array1<f64>,
}

impl DoubleDecay {
    fn model(x: f64, p: &Array1<f64>) -> f64 {
        p[0] * (-x / p[1]).exp() + p[2] * (-x / p[3]).exp()
    }

    fn generate(p: Array1<f64>) -> Self {
        let x = Array1::linspace(0.0, 10.0, 60);
        let y = x.mapv(|x| Self::model(x, &p));
        Self { x, y }
    }
}

impl Problem for DoubleDecay {
    fn eval(&self, p: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self.x.mapv(|x| Self::model(x, p)) - &self.y)
    }

    fn parameter_count(&self) -> usize {
        4
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }
}

/// Powell's badly scaled function, with its analytic Jacobian.
struct PowellBadlyScaled;

impl Problem for PowellBadlyScaled {
    fn eval(&self, p: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(array![
            1e4 * p[0] * p[1] - 1.0,
            (-p[0]).exp() + (-p[1]).exp() - 1.0001
        ])
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        2
    }

    fn jacobian(&self, p: &Array1<f64>) -> Result<Array2<f64>> {
        Ok(array![
            [1e4 * p[1], 1e4 * p[0]],
            [-(-p[0]).exp(), -(-p[1]).exp()]
        ])
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

#[test]
fn test_double_exponential() {
    crate::test_helpers::init_logging();
    let problem = DoubleDecay::generate(array![3.0, 0.5, 1.0, 4.0]);

    let result = LevenbergMarquardt::new()
        .with_differentiation_method(DiffMethod::Central)
        .minimize(&problem, array![2.0, 0.8, 2.0, 3.0])
        .unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.params[0], 3.0, max_relative = 1e-6);
    assert_relative_eq!(result.params[1], 0.5, max_relative = 1e-6);
    assert_relative_eq!(result.params[2], 1.0, max_relative = 1e-6);
    assert_relative_eq!(result.params[3], 4.0, max_relative = 1e-6);
}

#[test]
fn test_badly_scaled_analytic_jacobian() {
    let result = LevenbergMarquardt::with_config(LmConfig {
        max_iterations: 1000,
        ..LmConfig::default()
    })
    .minimize(&PowellBadlyScaled, array![0.0, 1.0])
    .unwrap();

    assert!(result.success, "{}", result);
    assert!(result.cost < 1e-20, "cost = {}", result.cost);
    assert_relative_eq!(result.params[0], 1.098159e-5, max_relative = 1e-4);
    assert_relative_eq!(result.params[1], 9.106146, max_relative = 1e-4);
    // analytic Jacobians cost no extra evaluations
    assert!(result.func_evals > result.iterations);
    assert!(result.func_evals < 10 * (result.iterations + 1));
}

#[test]
fn test_already_at_minimum() {
    let problem = DoubleDecay::generate(array![3.0, 0.5, 1.0, 4.0]);
    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![3.0, 0.5, 1.0, 4.0])
        .unwrap();

    assert!(result.success);
    assert_eq!(result.status, ConvergenceStatus::FunctionValueConvergence);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.cost, 0.0);
}
