//! Unified error handling for Plinth Core.
//!
//! This module provides a unified error type that wraps hook (event and
//! middleware) errors and application errors, with user-actionable
//! suggestions and a module tag for attribution.

use thiserror::Error;

use crate::application::{ApplicationError, ExternalProcessError};
use crate::domain::HookError;

/// Root error type for Plinth Core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Errors raised while registering or dispatching hooks.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Errors from the application layer (external collaborators).
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl CoreError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Hook(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check your setup and try again".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in Plinth".into(),
                "Please report it with the output of `plinth -vvv`".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Hook(e) => e.category(),
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Module or plugin tag identifying where the failure originated.
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::Hook(e) => e.module(),
            Self::Application(e) => e.module(),
            _ => None,
        }
    }
}

impl From<ExternalProcessError> for CoreError {
    fn from(err: ExternalProcessError) -> Self {
        Self::Application(err.into())
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Configuration,
    External,
    Internal,
}

/// Convenient result type alias.
pub type CoreResult<T> = Result<T, CoreError>;

/// Extension trait for adding context to errors.
pub trait Context<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> CoreResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> CoreResult<T> {
        self.map_err(|e| CoreError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_process_error_keeps_module_tag() {
        let err: CoreError = ApplicationError::from(ExternalProcessError::new(
            "NewCommand",
            "npm install",
            "npm ERR! missing script",
        ))
        .into();

        assert_eq!(err.module(), Some("NewCommand"));
        assert_eq!(err.category(), ErrorCategory::External);
        assert!(err.to_string().contains("npm ERR! missing script"));
    }

    #[test]
    fn unknown_slot_is_a_validation_error() {
        let err: CoreError = HookError::UnknownSlot {
            slot: "prebuild".into(),
            available: vec!["build".into()],
        }
        .into();

        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.suggestions().iter().any(|s| s.contains("build")));
    }

    #[test]
    fn context_wraps_foreign_errors_as_internal() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::other("disk on fire"));
        let err = result.context("writing manifest").unwrap_err();
        assert!(matches!(err, CoreError::Internal { .. }));
        assert!(err.to_string().contains("writing manifest: disk on fire"));
    }
}
