//! Outcome of a validation pass.

use serde::Serialize;
use std::fmt;

/// A problem that blocks launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// What is wrong.
    pub message: String,
    /// How to fix it.
    pub suggestion: String,
}

/// A problem worth reporting that does not block launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    /// What may go wrong.
    pub message: String,
    /// What to do about it.
    pub suggestion: String,
}

impl ValidationError {
    /// Creates an error.
    #[must_use]
    pub fn new(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

impl ValidationWarning {
    /// Creates a warning.
    #[must_use]
    pub fn new(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.suggestion)
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.suggestion)
    }
}

/// Errors and warnings collected by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Blocking problems.
    pub errors: Vec<ValidationError>,
    /// Non-blocking problems.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// True iff there are no errors. Warnings never block.
    #[must_use]
    pub fn can_launch(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Records an error.
    pub fn error(&mut self, message: impl Into<String>, suggestion: impl Into<String>) {
        self.errors.push(ValidationError::new(message, suggestion));
    }

    /// Records a warning.
    pub fn warn(&mut self, message: impl Into<String>, suggestion: impl Into<String>) {
        self.warnings.push(ValidationWarning::new(message, suggestion));
    }
}
