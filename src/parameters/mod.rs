//! # Parameter System
//!
//! Named fit parameters with bounds and vary flags, similar to lmfit-py.
//!
//! - [`Parameter`]: a single value with bounds, a vary flag and a fitted error
//! - [`Bounds`] and [`BoundsTransform`]: bounds handling during optimization
//! - [`LineshapeParams`]: the seven parameters of the deuteron lineshape,
//!   indexed by [`ParamName`]
//! - [`ParameterSet`]: the view of a parameter collection the optimizer uses
//!
//! ## Example Usage
//!
//! ```rust
//! use deuteron_fit::parameters::{LineshapeParams, ParamName, ParameterSet};
//!
//! let mut params = LineshapeParams::from_values([
//!     ("A", 0.03), ("G", -0.00003), ("r", 1.2), ("wQ", 0.027),
//!     ("wL", 32.69), ("eta", -0.02), ("xi", -0.001),
//! ])
//! .unwrap();
//!
//! // Hold the Larmor frequency fixed and keep the width positive
//! params[ParamName::WL].set_vary(false);
//! params[ParamName::A].set_min(0.0).unwrap();
//!
//! assert_eq!(params.varying_indices().len(), 6);
//! ```

pub mod bounds;
pub mod lineshape_params;
pub mod parameter;

pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use lineshape_params::{LineshapeParams, ParamName, ParamSpec};
pub use parameter::{Parameter, ParameterError};

/// An ordered collection of parameters that a [`Model`](crate::model::Model)
/// is evaluated with.
///
/// The order of [`as_slice`](ParameterSet::as_slice) is the order in which
/// parameter values are handed to the model.
pub trait ParameterSet: Clone + Send + Sync {
    /// All parameters, in model order.
    fn as_slice(&self) -> &[Parameter];

    /// All parameters, in model order, mutably.
    fn as_mut_slice(&mut self) -> &mut [Parameter];

    /// Look a parameter up by name.
    fn get(&self, name: &str) -> Option<&Parameter> {
        self.as_slice().iter().find(|p| p.name() == name)
    }

    /// Names of all parameters, in model order.
    fn names(&self) -> Vec<&str> {
        self.as_slice().iter().map(|p| p.name()).collect()
    }

    /// Current values of all parameters, in model order.
    fn value_vec(&self) -> Vec<f64> {
        self.as_slice().iter().map(|p| p.value()).collect()
    }

    /// Positions of the parameters the optimizer is allowed to vary.
    fn varying_indices(&self) -> Vec<usize> {
        self.as_slice()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_free())
            .map(|(i, _)| i)
            .collect()
    }
}
