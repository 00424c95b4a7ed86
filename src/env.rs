//! Access to the process environment shared by the shell and its children.
//!
//! Variables are read from and written to the real process environment so
//! that every launched program inherits them unchanged.

use std::env as stdenv;
use thiserror::Error;

/// Reasons a variable cannot be stored in the process environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("invalid variable name {0:?}")]
    InvalidName(String),
    #[error("value of {0} contains a NUL byte")]
    InvalidValue(String),
}

/// Get the value of an environment variable, if set and valid unicode.
pub fn var(key: &str) -> Option<String> {
    stdenv::var(key).ok()
}

/// Set or override an environment variable.
///
/// Names that are empty or contain `=` or NUL, and values containing NUL, are
/// rejected instead of being handed to the platform.
pub fn set_var(key: &str, value: &str) -> Result<(), EnvError> {
    if key.is_empty() || key.contains(['=', '\0']) {
        return Err(EnvError::InvalidName(key.to_string()));
    }
    if value.contains('\0') {
        return Err(EnvError::InvalidValue(key.to_string()));
    }
    // SAFETY: the interpreter is single-threaded; only the foreground thread
    // touches the environment, from inside the `cd` built-in.
    unsafe { stdenv::set_var(key, value) };
    Ok(())
}
