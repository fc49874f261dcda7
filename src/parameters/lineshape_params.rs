//! The seven named parameters of the deuteron lineshape.
//!
//! [`LineshapeParams`] replaces a loosely typed name→value dictionary with a
//! fixed set of [`Parameter`]s indexed by [`ParamName`]. Name-based lookup
//! still exists for configuration files and reports, but it is checked once
//! when the set is built rather than on every model evaluation.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::error::{FitError, Result};
use crate::lineshape::LineshapeValues;
use crate::parameters::{Parameter, ParameterError, ParameterSet};

/// Names of the lineshape parameters, in model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamName {
    /// Dipolar broadening width
    A,
    /// Amplitude scale factor
    G,
    /// Asymmetry parameter
    R,
    /// Quadrupolar splitting frequency
    WQ,
    /// Larmor frequency
    WL,
    /// Peak-width shaping factor
    Eta,
    /// Mistuning (false asymmetry) correction
    Xi,
}

impl ParamName {
    /// All parameters in model order.
    pub const ALL: [ParamName; 7] = [
        ParamName::A,
        ParamName::G,
        ParamName::R,
        ParamName::WQ,
        ParamName::WL,
        ParamName::Eta,
        ParamName::Xi,
    ];

    /// The conventional spelling used in configuration files and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::A => "A",
            ParamName::G => "G",
            ParamName::R => "r",
            ParamName::WQ => "wQ",
            ParamName::WL => "wL",
            ParamName::Eta => "eta",
            ParamName::Xi => "xi",
        }
    }

    /// Position of the parameter in [`ParamName::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamName {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        ParamName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| FitError::UnknownParameter(s.to_string()))
    }
}

/// How a single parameter is written in a configuration file: either a bare
/// number or an object with optional bounds and vary flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamSpec {
    Value(f64),
    Full {
        value: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default = "default_vary")]
        vary: bool,
    },
}

fn default_vary() -> bool {
    true
}

impl ParamSpec {
    fn into_parameter(self, name: ParamName) -> std::result::Result<Parameter, ParameterError> {
        match self {
            ParamSpec::Value(value) => Ok(Parameter::new(name.as_str(), value)),
            ParamSpec::Full {
                value,
                min,
                max,
                vary,
            } => Ok(Parameter::with_bounds(
                name.as_str(),
                value,
                min.unwrap_or(f64::NEG_INFINITY),
                max.unwrap_or(f64::INFINITY),
            )?
            .vary_with(vary)),
        }
    }
}

/// Strongly typed parameter set for the deuteron lineshape model.
#[derive(Debug, Clone, PartialEq)]
pub struct LineshapeParams {
    params: [Parameter; 7],
}

impl LineshapeParams {
    /// Create an unbounded, fully varying parameter set from plain values.
    pub fn new(values: LineshapeValues) -> Self {
        let v = values.to_array();
        Self {
            params: ParamName::ALL.map(|name| Parameter::new(name.as_str(), v[name.index()])),
        }
    }

    /// Build the set from `(name, value)` pairs such as a `HashMap<String, f64>`.
    ///
    /// Every one of the seven names must be present. Unknown names are
    /// rejected so a misspelt key cannot silently fall back to a default.
    ///
    /// # Examples
    ///
    /// ```
    /// use deuteron_fit::parameters::{LineshapeParams, ParamName};
    ///
    /// let params = LineshapeParams::from_values([
    ///     ("A", 0.03), ("G", -0.00003), ("r", 1.2), ("wQ", 0.027),
    ///     ("wL", 32.69), ("eta", -0.02), ("xi", -0.001),
    /// ]).unwrap();
    /// assert_eq!(params[ParamName::WL].value(), 32.69);
    ///
    /// assert!(LineshapeParams::from_values([("A", 0.03)]).is_err());
    /// ```
    pub fn from_values<I, K>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        Self::from_specs(
            values
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), ParamSpec::Value(v))),
        )
    }

    /// Build the set from `(name, spec)` pairs, as read from a config file.
    pub fn from_specs<I, K>(specs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, ParamSpec)>,
        K: AsRef<str>,
    {
        let mut slots: BTreeMap<ParamName, ParamSpec> = BTreeMap::new();
        for (key, spec) in specs {
            let name: ParamName = key.as_ref().parse()?;
            slots.insert(name, spec);
        }

        let mut params = Vec::with_capacity(ParamName::ALL.len());
        for name in ParamName::ALL {
            let spec = slots
                .remove(&name)
                .ok_or_else(|| FitError::MissingParameter(name.as_str().to_string()))?;
            params.push(spec.into_parameter(name)?);
        }

        let params: [Parameter; 7] = params
            .try_into()
            .map_err(|_| FitError::InvalidInput("lineshape needs seven parameters".to_string()))?;
        Ok(Self { params })
    }

    /// Current values of all seven parameters.
    pub fn values(&self) -> LineshapeValues {
        let mut values = [0.0; 7];
        for (slot, param) in values.iter_mut().zip(&self.params) {
            *slot = param.value();
        }
        LineshapeValues::from_array(values)
    }

    /// Lower-bound `A`, `wQ` and `r` at zero where no lower bound was given.
    ///
    /// The lineshape is only well defined for positive broadening, splitting
    /// and asymmetry, so these are the usual constraints for a fit.
    ///
    /// A start value of exactly zero lands on the new bound, where the bounds
    /// transform has zero slope: the fit keeps that parameter at zero. Start
    /// from a small positive value instead ([`Parameter::is_at_bound`]).
    pub fn with_physical_bounds(mut self) -> Result<Self> {
        for name in [ParamName::A, ParamName::WQ, ParamName::R] {
            let param = &mut self.params[name.index()];
            if !param.bounds().has_lower_bound() {
                param.set_min(0.0)?;
            }
        }
        Ok(self)
    }

    /// Fix a parameter at its current value.
    pub fn fix(mut self, name: ParamName) -> Self {
        self[name].set_vary(false);
        self
    }

    /// Iterate over `(name, parameter)` pairs in model order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamName, &Parameter)> {
        ParamName::ALL.into_iter().zip(self.params.iter())
    }
}

impl Index<ParamName> for LineshapeParams {
    type Output = Parameter;

    fn index(&self, name: ParamName) -> &Parameter {
        &self.params[name.index()]
    }
}

impl IndexMut<ParamName> for LineshapeParams {
    fn index_mut(&mut self, name: ParamName) -> &mut Parameter {
        &mut self.params[name.index()]
    }
}

impl ParameterSet for LineshapeParams {
    fn as_slice(&self) -> &[Parameter] {
        &self.params
    }

    fn as_mut_slice(&mut self) -> &mut [Parameter] {
        &mut self.params
    }
}

impl Serialize for LineshapeParams {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.params.len()))?;
        for (name, param) in self.iter() {
            map.serialize_entry(name.as_str(), param)?;
        }
        map.end()
    }
}
