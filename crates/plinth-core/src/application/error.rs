//! Application layer errors.
//!
//! Failures of the external collaborators the commands drive: template
//! retrieval, package installation and the filesystem around them. Hook
//! failures are `HookError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// A child process exited unsuccessfully.
///
/// `module` names the command or plugin that spawned it, so the user can
/// tell which part of the tool failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("[{module}] '{command}' failed: {stderr}")]
pub struct ExternalProcessError {
    pub module: String,
    pub command: String,
    pub stderr: String,
}

impl ExternalProcessError {
    pub fn new(
        module: impl Into<String>,
        command: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            command: command.into(),
            stderr: stderr.into().trim_end().to_string(),
        }
    }
}

/// Errors that occur while driving external collaborators.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// An external process (git, npm) failed.
    #[error(transparent)]
    ExternalProcess(#[from] ExternalProcessError),

    /// The project template could not be retrieved.
    #[error("Failed to fetch template '{repository}': {reason}")]
    TemplateFetch { repository: String, reason: String },

    /// Project already exists at target location.
    #[error("Project already exists at {path}")]
    ProjectExists { path: PathBuf },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    Filesystem { path: PathBuf, reason: String },

    /// The marketplace could not be read.
    #[error("Marketplace unavailable: {reason}")]
    Marketplace { reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ExternalProcess(e) => vec![
                format!("'{}' reported an error", e.command),
                "Run the command manually inside the project to see its full output".into(),
            ],
            Self::TemplateFetch { repository, .. } => vec![
                format!("Could not retrieve {}", repository),
                "Check your network connection and that git is installed".into(),
                "Or use a local copy with --template-dir".into(),
            ],
            Self::ProjectExists { path } => vec![
                format!("Directory already exists: {}", path.display()),
                "Use --overwrite to replace it (destructive)".into(),
                "Choose a different project directory".into(),
            ],
            Self::Filesystem { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::Marketplace { .. } => vec!["Try again in a moment".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ExternalProcess(_) | Self::TemplateFetch { .. } | Self::Marketplace { .. } => {
                ErrorCategory::External
            }
            Self::ProjectExists { .. } => ErrorCategory::Validation,
            Self::Filesystem { .. } => ErrorCategory::Internal,
        }
    }

    /// Module tag of the failing collaborator, if known.
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::ExternalProcess(e) => Some(&e.module),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_process_error_trims_trailing_output() {
        let err = ExternalProcessError::new("NewCommand", "npm install", "npm ERR! boom\n\n");
        assert_eq!(err.stderr, "npm ERR! boom");
        assert_eq!(err.to_string(), "[NewCommand] 'npm install' failed: npm ERR! boom");
    }

    #[test]
    fn existing_project_suggests_overwrite() {
        let err = ApplicationError::ProjectExists {
            path: PathBuf::from("my-app"),
        };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.suggestions().iter().any(|s| s.contains("--overwrite")));
    }
}
