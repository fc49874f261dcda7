//! Fit configuration files.
//!
//! A fit is described by a JSON document holding the starting parameters and,
//! optionally, optimizer settings:
//!
//! ```json
//! {
//!   "parameters": {
//!     "A": { "value": 0.03, "min": 0.0 },
//!     "G": -0.00003,
//!     "r": { "value": 1.2, "min": 0.0 },
//!     "wQ": { "value": 0.027, "min": 0.0 },
//!     "wL": 32.69,
//!     "eta": { "value": -0.02, "vary": false },
//!     "xi": -0.001
//!   },
//!   "optimizer": { "max_iterations": 500 }
//! }
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{FitError, Result};
use crate::lm::LmConfig;
use crate::parameters::{LineshapeParams, ParamSpec};

/// Starting parameters and optimizer settings for a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitConfig {
    pub parameters: LineshapeParams,
    pub optimizer: LmConfig,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFitConfig {
    parameters: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    optimizer: LmConfig,
}

impl TryFrom<RawFitConfig> for FitConfig {
    type Error = FitError;

    fn try_from(raw: RawFitConfig) -> Result<Self> {
        Ok(Self {
            parameters: LineshapeParams::from_specs(raw.parameters)?,
            optimizer: raw.optimizer,
        })
    }
}

impl FitConfig {
    pub fn new(parameters: LineshapeParams) -> Self {
        Self {
            parameters,
            optimizer: LmConfig::default(),
        }
    }

    /// Parse a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// [`FitError::Json`] for malformed JSON,
    /// [`FitError::MissingParameter`] and [`FitError::UnknownParameter`] for
    /// an incomplete or misspelt parameter table, and
    /// [`FitError::Parameter`] for a parameter whose min exceeds its max.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawFitConfig = serde_json::from_str(json)?;
        raw.try_into()
    }

    /// Read a configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
