//! Error handling for the Plinth CLI.
//!
//! Provides structured errors with:
//! - User-friendly messages
//! - Actionable suggestions
//! - Exit code mapping

use std::error::Error;
use std::path::PathBuf;

use owo_colors::{OwoColorize, Style};
use thiserror::Error;

use plinth_core::domain::HookError;
use plinth_core::error::{CoreError, ErrorCategory as CoreCategory};

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A `--platform` or `--server` selector matched no marketplace plugin.
    #[error("Unknown plugin '{selector}'")]
    UnknownPlugin {
        selector: String,
        available: Vec<String>,
    },

    /// A configuration file could not be read, parsed, or written.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The config file `plinth init` would write already exists.
    #[error("Configuration file already exists at {path}")]
    ConfigExists { path: PathBuf },

    /// An error propagated from `plinth-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<HookError> for CliError {
    fn from(err: HookError) -> Self {
        Self::Core(CoreError::Hook(err))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

/// The core error a listener or step failed with, when it carried one.
///
/// Hooks report failures as `anyhow::Error`; a `CoreError` inside still
/// decides category and suggestions.
fn innermost(err: &CoreError) -> &CoreError {
    match err {
        CoreError::Hook(
            HookError::ListenerFailure { source, .. } | HookError::StepFailure { source, .. },
        ) => source
            .downcast_ref::<CoreError>()
            .map(innermost)
            .unwrap_or(err),
        _ => err,
    }
}

impl CliError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidInput { message } => vec![
                format!("Check your input: {message}"),
                "Use --help for usage information".into(),
            ],

            Self::UnknownPlugin {
                selector,
                available,
            } => {
                let mut suggestions = vec![format!("No marketplace plugin matches '{selector}'")];
                if !available.is_empty() {
                    suggestions.push(format!("Available: {}", available.join(", ")));
                }
                suggestions.push("List plugins with: plinth plugins".into());
                suggestions
            }

            Self::Configuration { message } => vec![
                format!("Configuration issue: {message}"),
                "Show the active config file with: plinth config path".into(),
                "Create a default config with: plinth init".into(),
            ],

            Self::ConfigExists { path } => vec![
                format!("'{}' is already present", path.display()),
                "Use --force to overwrite it".into(),
            ],

            Self::Core(core) => innermost(core).suggestions(),

            Self::Io { .. } => vec![
                "Check file permissions".into(),
                "Ensure the parent directory exists".into(),
            ],
        }
    }

    /// Get the error category for styling and exit codes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } | Self::UnknownPlugin { .. } | Self::ConfigExists { .. } => {
                ErrorCategory::UserError
            }
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Core(core) => match innermost(core).category() {
                CoreCategory::Validation => ErrorCategory::UserError,
                CoreCategory::NotFound => ErrorCategory::NotFound,
                CoreCategory::Configuration => ErrorCategory::Configuration,
                CoreCategory::External => ErrorCategory::External,
                CoreCategory::Internal => ErrorCategory::Internal,
            },
            Self::Io { .. } => ErrorCategory::Internal,
        }
    }

    /// Exit code to pass to the OS.
    ///
    /// | Category      | Code |
    /// |---------------|------|
    /// | User error    |  2   |
    /// | Not found     |  3   |
    /// | Configuration |  4   |
    /// | External      |  1   |
    /// | Internal      |  1   |
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::UserError => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::Configuration => 4,
            ErrorCategory::External | ErrorCategory::Internal => 1,
        }
    }

    /// Coloured report for a terminal: message, causes when `verbose`,
    /// then suggestions.
    pub fn format_colored(&self, verbose: bool) -> String {
        self.render(verbose, true)
    }

    /// Same layout as [`Self::format_colored`] without ANSI codes.
    pub fn format_plain(&self, verbose: bool) -> String {
        self.render(verbose, false)
    }

    fn render(&self, verbose: bool, colored: bool) -> String {
        let paint = |text: &str, style: Style| {
            if colored {
                text.style(style).to_string()
            } else {
                text.to_string()
            }
        };

        let mut lines = vec![
            String::new(),
            format!("{} {self}", paint("\u{2717} Error:", Style::new().red().bold())),
        ];

        if verbose {
            let causes = std::iter::successors(self.source(), |err| (*err).source());
            lines.extend(causes.map(|cause| {
                paint(&format!("  caused by: {cause}"), Style::new().dimmed())
            }));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            lines.push(String::new());
            lines.push(paint("Suggestions:", Style::new().yellow().bold()));
            lines.extend(suggestions.iter().map(|s| format!("  - {s}")));
        }

        if !verbose {
            lines.push(String::new());
            lines.push(paint("Run with -v / --verbose for more details.", Style::new().dimmed()));
        }

        lines.push(String::new());
        lines.join("\n")
    }

    /// Log the error using tracing.
    pub fn log(&self) {
        let module = match self {
            Self::Core(core) => innermost(core).module(),
            _ => None,
        };
        match self.category() {
            ErrorCategory::UserError => tracing::warn!(module, "User error: {}", self),
            ErrorCategory::NotFound => tracing::warn!(module, "Not found: {}", self),
            ErrorCategory::Configuration => tracing::error!("Configuration error: {}", self),
            ErrorCategory::External => tracing::error!(module, "External tool failed: {}", self),
            ErrorCategory::Internal => tracing::error!(module, "Internal error: {}", self),
        }

        if let Some(source) = self.source() {
            tracing::debug!("Caused by: {}", source);
        }
    }
}

/// Error categories for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// User input error (validation, invalid arguments).
    UserError,
    /// Resource not found.
    NotFound,
    /// Configuration error.
    Configuration,
    /// An external tool (git, npm) failed.
    External,
    /// Internal/system error.
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use plinth_core::application::{ApplicationError, ExternalProcessError};
    use std::io;

    fn project_exists() -> CoreError {
        ApplicationError::ProjectExists {
            path: PathBuf::from("/tmp/app"),
        }
        .into()
    }

    #[test]
    fn unknown_plugin_lists_available() {
        let err = CliError::UnknownPlugin {
            selector: "googl".into(),
            available: vec!["alexa".into(), "core".into()],
        };
        assert!(err.suggestions().iter().any(|s| s.contains("alexa, core")));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn project_exists_is_user_error() {
        let err = CliError::from(project_exists());
        assert_eq!(err.exit_code(), 2);
        assert!(err.suggestions().iter().any(|s| s.contains("--overwrite")));
    }

    #[test]
    fn step_failure_uses_inner_core_category() {
        let err = CliError::from(HookError::StepFailure {
            slot: "new".into(),
            index: 0,
            source: anyhow::Error::new(project_exists()),
        });
        assert_eq!(err.category(), ErrorCategory::UserError);
        assert!(err.suggestions().iter().any(|s| s.contains("--overwrite")));
    }

    #[test]
    fn step_failure_with_plain_error_stays_hook_error() {
        let err = CliError::from(HookError::StepFailure {
            slot: "new".into(),
            index: 1,
            source: anyhow::anyhow!("boom"),
        });
        assert!(!err.suggestions().is_empty());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn external_process_exits_with_one() {
        let core: CoreError = ExternalProcessError::new("NewCommand", "npm install", "ERR").into();
        let err = CliError::from(core);
        assert_eq!(err.category(), ErrorCategory::External);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn exit_code_configuration() {
        let err = CliError::Configuration {
            message: "x".into(),
        };
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn exit_code_internal() {
        let err = CliError::from(io::Error::other("e"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn format_plain_contains_error_header() {
        let err = CliError::ConfigExists {
            path: PathBuf::from("/tmp/x"),
        };
        let s = err.format_plain(false);
        assert!(s.contains("Error:"));
        assert!(s.contains("Suggestions:"));
        assert!(s.contains("--verbose"));
    }

    #[test]
    fn verbose_report_walks_into_step_failures() {
        let err = CliError::from(HookError::StepFailure {
            slot: "new".into(),
            index: 1,
            source: anyhow::anyhow!("template server unreachable"),
        });
        let s = err.format_plain(true);
        assert!(s.contains("step #1 in middleware slot 'new' failed"));
        assert!(s.contains("caused by: template server unreachable"));

        let colored = err.format_colored(true);
        assert!(colored.contains("template server unreachable"));
    }

    #[test]
    fn format_plain_verbose_lists_causes() {
        let err = CliError::from(io::Error::other("disk full"));
        let s = err.format_plain(true);
        assert!(s.contains("caused by: disk full"));
        assert!(!s.contains("--verbose"));
    }
}
