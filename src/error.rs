//! Engine error types.

use thiserror::Error;

/// Errors returned by the engine's top-level operations.
///
/// Per-attribute read failures are not errors: they are collected as
/// [`AttributeReadFailure`] values while projection continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("invalid parameter '{param}': {message}")]
    Validation { param: String, message: String },
    #[error("{what} not found: {selector}")]
    NotFound { what: &'static str, selector: String },
    #[error("writing '{type_name}' sequences is not supported")]
    UnsupportedWrite { type_name: String },
    #[error("type '{type_name}' has no default constructor")]
    NotConstructible { type_name: String },
}

impl ProjectionError {
    pub fn validation(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            param: param.into(),
            message: message.into(),
        }
    }
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// A single attribute that could not be read during projection.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeReadFailure {
    /// `Type.attribute`, e.g. `Camera.aspect`.
    pub attribute: String,
    pub message: String,
}
