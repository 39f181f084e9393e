use std::{fmt::Display, str::FromStr};

use thiserror::Error;

/// Errors raised while reading process environment variables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvVarError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    Missing(String),

    /// The variable is set but its value could not be parsed into the requested type.
    #[error("Invalid value for environment variable {name}: {message}")]
    Invalid {
        /// Name of the offending variable.
        name: String,
        /// Parser message for the rejected value.
        message: String,
    },
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, EnvVarError> {
    std::env::var(name).map_err(|_| EnvVarError::Missing(name.to_string()))
}

/// Reads an optional environment variable and parses it with [`FromStr`].
///
/// Returns `Ok(None)` when the variable is unset or blank, so callers can layer
/// it over a file-provided default.
pub fn get_env_parsed<T>(name: &str) -> Result<Option<T>, EnvVarError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = match std::env::var(name) {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|e| EnvVarError::Invalid {
            name: name.to_string(),
            message: e.to_string(),
        })
}
