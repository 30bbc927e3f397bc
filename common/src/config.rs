//! Environment variable parsing helpers
//!
//! Provides ergonomic helpers for reading configuration from environment variables
//! and an optional `.env` file.

use std::env;
use std::path::{Path, PathBuf};

/// Extension trait for parsing environment variables.
///
/// Provides convenient methods for reading env vars with defaults and optional values.
pub trait ConfigExt {
    /// Get an environment variable with a default value.
    ///
    /// # Example
    /// ```ignore
    /// let package = String::env_or("PROVISION_PACKAGE", "postgresql");
    /// ```
    fn env_or(name: &str, default: &str) -> String {
        env::var(name).unwrap_or_else(|_| default.to_string())
    }

    /// Get an environment variable, treating unset and empty alike.
    fn env_non_empty(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.is_empty())
    }

    /// Get an environment variable as a boolean.
    ///
    /// Returns `true` if the value is "true" (case-insensitive), otherwise `default`.
    fn env_bool(name: &str, default: bool) -> bool {
        env::var(name)
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(default)
    }
}

// Blanket implementation for all types
impl<T> ConfigExt for T {}

/// Load variables from a `.env` file into the process environment.
///
/// Variables already set in the environment win. A missing file is not an
/// error and yields `Ok(None)`. A malformed file is an error; lines before the
/// bad one may already have been applied.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<Option<PathBuf>, dotenvy::Error> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    dotenvy::from_path(path)?;
    Ok(Some(path.to_path_buf()))
}
