// File: src/error.rs
// Purpose: Error types for the validation engine

use thiserror::Error;

/// Errors that interrupt control flow.
///
/// A field failing its rules is not an error: it is reported through the
/// error map and the boolean results of `validate`/`validate_field`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    #[error("form not found: {0}")]
    FormNotFound(String),
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
