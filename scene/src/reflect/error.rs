//! Error types for reflected attribute access.

use std::fmt;

/// Errors that can occur while reading a reflected attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    /// The accessor was handed an instance of the wrong type.
    TypeMismatch { expected: &'static str },
    /// The attribute exists but cannot be evaluated in the current state
    /// (missing render target, singular matrix, detached object, ...).
    Unavailable {
        attribute: &'static str,
        reason: String,
    },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected } => {
                write!(f, "accessor expected an instance of '{expected}'")
            }
            Self::Unavailable { attribute, reason } => {
                write!(f, "attribute '{attribute}' is unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for ReadError {}

/// Errors that can occur while writing a reflected attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteError {
    /// The accessor was handed an instance of the wrong type.
    TypeMismatch { expected: &'static str },
    /// The input kind does not fit the attribute (a record handed to a
    /// scalar field, a reference handed to a string, ...).
    InputMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Wire data could not be decoded into the field's type.
    Decode { message: String },
    /// The attribute has no setter.
    ReadOnly { attribute: &'static str },
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected } => {
                write!(f, "accessor expected an instance of '{expected}'")
            }
            Self::InputMismatch { expected, found } => {
                write!(f, "input mismatch: expected {expected}, found {found}")
            }
            Self::Decode { message } => write!(f, "decode error: {message}"),
            Self::ReadOnly { attribute } => write!(f, "attribute '{attribute}' is read-only"),
        }
    }
}

impl std::error::Error for WriteError {}
