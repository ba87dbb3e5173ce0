//! Error types for the Soong provisioning system.
//!
//! Two layers: [`ProviderError`] is the only failure the Lambda API client
//! ever returns, and [`SoongError`] is the crate-wide error used by the
//! configuration layer and the binary. Validation problems are not errors
//! here; they are accumulated as data in
//! [`ValidationResult`](crate::validation::ValidationResult).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the Soong system.
#[derive(Debug, Error)]
pub enum SoongError {
    /// Lambda Cloud API errors.
    #[error("Lambda API error: {0}")]
    Provider(#[from] ProviderError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a Lambda Cloud API call.
///
/// Every transport failure and every non-2xx response is folded into
/// [`ProviderError::RequestFailed`] once the retry budget is spent; the
/// message of the last attempt is kept for diagnostics.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request kept failing until the retry budget was exhausted.
    #[error("API request failed after {attempts} attempts: {message}")]
    RequestFailed {
        /// Number of attempts made.
        attempts: u32,
        /// Underlying cause of the final attempt.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Invalid response from Lambda API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },

    /// A launch call succeeded but named no instance.
    #[error("No instance ID returned from launch")]
    EmptyLaunch,

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {message}")]
    ClientBuild {
        /// Description of the build failure.
        message: String,
    },
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        /// Name of the variable.
        name: String,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The `.env` file exists but could not be loaded.
    #[error("Failed to load {}: {message}", path.display())]
    DotenvLoad {
        /// Path to the `.env` file.
        path: PathBuf,
        /// Description of the load failure.
        message: String,
    },
}

/// Result type alias for Soong operations.
pub type Result<T> = std::result::Result<T, SoongError>;

/// Result type alias for Lambda API calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl SoongError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl ProviderError {
    /// Creates an exhausted-retries error.
    #[must_use]
    pub fn request_failed(attempts: u32, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            attempts,
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// Creates an invalid-value error for an environment variable.
    #[must_use]
    pub fn invalid_value(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
