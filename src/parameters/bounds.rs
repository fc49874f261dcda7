//! Parameter bounds
//!
//! Bounds on a lineshape parameter and the Minuit-style transformation that
//! lets the optimizer work in an unbounded internal space while the model
//! only ever sees values inside `[min, max]`.

use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Non-finite parameter value is not allowed")]
    NonFiniteValue,
}

/// Represents the bounds constraints on a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

// Infinite bounds are written as `null` so the JSON stays valid.
impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Bounds", 2)?;
        state.serialize_field("min", &self.min.is_finite().then_some(self.min))?;
        state.serialize_field("max", &self.max.is_finite().then_some(self.max))?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BoundsHelper {
            #[serde(default)]
            min: Option<f64>,

            #[serde(default)]
            max: Option<f64>,
        }

        let helper = BoundsHelper::deserialize(deserializer)?;
        Bounds::new(
            helper.min.unwrap_or(NEG_INFINITY),
            helper.max.unwrap_or(INFINITY),
        )
        .map_err(serde::de::Error::custom)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create a new bounds constraint with min and max values
    ///
    /// # Examples
    ///
    /// ```
    /// use deuteron_fit::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert_eq!(bounds.max, 10.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Create an unbounded constraint (negative infinity to positive infinity)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Create a bounds constraint with only a minimum value
    pub fn min_only(min: f64) -> Self {
        Self { min, max: INFINITY }
    }

    /// Create a bounds constraint with only a maximum value
    pub fn max_only(max: f64) -> Self {
        Self {
            min: NEG_INFINITY,
            max,
        }
    }

    /// Check if a value is within the bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if the parameter is bounded from below
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    /// Check if the parameter is bounded from above
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Clamp a value to be within the bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Minuit-style parameter transformation for bounds constraints.
///
/// The optimizer varies an unbounded internal value; [`to_external`] maps it
/// back into `[min, max]`:
///
/// - lower bound only: `min - 1 + sqrt(p² + 1)`
/// - upper bound only: `max + 1 - sqrt(p² + 1)`
/// - both bounds: `min + (sin(p) + 1) (max - min) / 2`
///
/// [`to_external`]: BoundsTransform::to_external
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    /// Create a new bounds transform
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// Transform an internal parameter value to an external value
    pub fn to_external(&self, internal_value: f64) -> f64 {
        let b = &self.bounds;
        let external = match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => internal_value,
            (true, false) => b.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => b.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => b.min + (internal_value.sin() + 1.0) * (b.max - b.min) / 2.0,
        };

        // rounding in the transform can step a hair outside the interval
        b.clamp(external)
    }

    /// Transform an external parameter value to an internal value
    ///
    /// # Returns
    ///
    /// The corresponding internal value, or an error if the external value is
    /// non-finite or outside bounds
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::NonFiniteValue);
        }

        let b = &self.bounds;
        if !b.is_within_bounds(external_value) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: b.min,
                max: b.max,
            });
        }

        let internal = match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => external_value,
            (true, false) => ((external_value - b.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((b.max - external_value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let scaled = 2.0 * (external_value - b.min) / (b.max - b.min) - 1.0;
                scaled.clamp(-1.0, 1.0).asin()
            }
        };

        Ok(internal)
    }
}
