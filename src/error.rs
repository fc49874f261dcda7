use thiserror::Error;

use crate::parameters::{BoundsError, ParameterError};

/// Error types for the deuteron-fit library.
#[derive(Error, Debug)]
pub enum FitError {
    /// Error indicating a mismatch in array or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A required lineshape parameter was not supplied.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// A parameter name that the lineshape model does not know.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for deuteron-fit operations.
pub type Result<T> = std::result::Result<T, FitError>;
