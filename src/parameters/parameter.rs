//! Parameter definition and implementation
//!
//! A [`Parameter`] is a single named fit quantity: its current value, the
//! value it started from, optional bounds, whether the optimizer may vary it,
//! and the standard error estimated by the last fit.

use crate::parameters::bounds::{Bounds, BoundsError, BoundsTransform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("parameter '{name}': {source}")]
    Bounds {
        name: String,
        #[source]
        source: BoundsError,
    },

    #[error("parameter '{name}' has non-finite value {value}")]
    NonFiniteValue { name: String, value: f64 },
}

/// A parameter for optimization problems
///
/// This is similar to lmfit-py's Parameter, without expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter
    name: String,

    /// Current value of the parameter
    value: f64,

    /// Initial value when created (for reset operations)
    init_value: f64,

    /// Whether this parameter can be varied during optimization
    #[serde(default = "default_vary")]
    vary: bool,

    /// Minimum and maximum bounds for the parameter value
    #[serde(default)]
    bounds: Bounds,

    /// Standard error of the parameter (set after fitting)
    #[serde(default)]
    stderr: Option<f64>,
}

fn default_vary() -> bool {
    true
}

impl Parameter {
    /// Create a new, unbounded, varying parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use deuteron_fit::parameters::Parameter;
    ///
    /// let param = Parameter::new("wL", 32.69);
    /// assert_eq!(param.name(), "wL");
    /// assert_eq!(param.value(), 32.69);
    /// assert!(param.vary());
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            init_value: value,
            vary: true,
            bounds: Bounds::default(),
            stderr: None,
        }
    }

    /// Create a new varying parameter constrained to `[min, max]`.
    ///
    /// The value is clamped into the bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use deuteron_fit::parameters::Parameter;
    ///
    /// let param = Parameter::with_bounds("A", 0.03, 0.0, f64::INFINITY).unwrap();
    /// assert_eq!(param.min(), 0.0);
    /// assert!(Parameter::with_bounds("A", 0.03, 1.0, 0.0).is_err());
    /// ```
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let mut param = Self::new(name, value);
        param.set_bounds(min, max)?;
        param.init_value = param.value;
        Ok(param)
    }

    /// Builder-style variant of [`set_vary`](Self::set_vary).
    pub fn vary_with(mut self, vary: bool) -> Self {
        self.vary = vary;
        self
    }

    /// Get the name of the parameter
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current value of the parameter
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value of the parameter
    ///
    /// Fails if the value is non-finite or outside the bounds.
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::NonFiniteValue {
                name: self.name.clone(),
                value,
            });
        }

        if !self.bounds.is_within_bounds(value) {
            return Err(ParameterError::Bounds {
                name: self.name.clone(),
                source: BoundsError::ValueOutsideBounds {
                    value,
                    min: self.bounds.min,
                    max: self.bounds.max,
                },
            });
        }

        self.value = value;
        Ok(())
    }

    /// Get the initial value of the parameter
    pub fn init_value(&self) -> f64 {
        self.init_value
    }

    /// Reset the parameter to its initial value and forget any fitted error
    pub fn reset(&mut self) {
        self.value = self.bounds.clamp(self.init_value);
        self.stderr = None;
    }

    /// Check if the parameter is varied during optimization
    pub fn vary(&self) -> bool {
        self.vary
    }

    /// Whether the optimizer may move this parameter.
    ///
    /// A varying parameter whose bounds collapse to a single value is held
    /// there, as if fixed.
    pub fn is_free(&self) -> bool {
        self.vary && self.bounds.min < self.bounds.max
    }

    /// Whether the value sits exactly on a finite bound.
    ///
    /// A free parameter started there has a zero gradient in internal space
    /// and will not move away from the bound.
    pub fn is_at_bound(&self) -> bool {
        (self.bounds.has_lower_bound() && self.value == self.bounds.min)
            || (self.bounds.has_upper_bound() && self.value == self.bounds.max)
    }

    /// Set whether the parameter is varied during optimization
    pub fn set_vary(&mut self, vary: bool) {
        self.vary = vary;
    }

    /// Get the minimum allowed value for the parameter
    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    /// Get the maximum allowed value for the parameter
    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    /// Get the bounds of the parameter
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Set the bounds for the parameter, clamping the current value into them
    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<(), ParameterError> {
        let bounds = Bounds::new(min, max).map_err(|source| ParameterError::Bounds {
            name: self.name.clone(),
            source,
        })?;
        self.bounds = bounds;
        self.value = bounds.clamp(self.value);
        Ok(())
    }

    /// Set the minimum bound for the parameter
    pub fn set_min(&mut self, min: f64) -> Result<(), ParameterError> {
        self.set_bounds(min, self.bounds.max)
    }

    /// Set the maximum bound for the parameter
    pub fn set_max(&mut self, max: f64) -> Result<(), ParameterError> {
        self.set_bounds(self.bounds.min, max)
    }

    /// Standard error estimated by the last fit, if any
    pub fn stderr(&self) -> Option<f64> {
        self.stderr
    }

    pub(crate) fn set_stderr(&mut self, stderr: Option<f64>) {
        self.stderr = stderr;
    }

    /// The internal/external transform for this parameter's bounds
    pub fn transform(&self) -> BoundsTransform {
        BoundsTransform::new(self.bounds)
    }
}
