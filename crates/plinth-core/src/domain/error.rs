// ============================================================================
// domain/error.rs - HOOK ERRORS
// ============================================================================

use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors raised by the event emitter, the middleware collection and the
/// plugin installation lifecycle.
///
/// Listener and step failures carry the original `anyhow::Error` so the
/// caller of `emit`/`run` sees the full cause chain.
#[derive(Debug, Error)]
pub enum HookError {
    // ========================================================================
    // Registration errors (raised synchronously)
    // ========================================================================
    #[error("unknown middleware slot '{slot}'")]
    UnknownSlot {
        slot: String,
        available: Vec<String>,
    },

    #[error("plugin '{plugin}' is already installed")]
    AlreadyInstalled { plugin: String },

    // ========================================================================
    // Dispatch errors (raised by emit/run)
    // ========================================================================
    #[error("listener #{index} for event '{event}' failed: {source}")]
    ListenerFailure {
        event: String,
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("step #{index} in middleware slot '{slot}' failed: {source}")]
    StepFailure {
        slot: String,
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    // ========================================================================
    // Plugin resolution
    // ========================================================================
    #[error("could not load plugin '{module}' from '{package}': {reason}")]
    PluginResolution {
        package: String,
        module: String,
        reason: String,
    },
}

impl HookError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnknownSlot { slot, available } => vec![
                format!("No middleware slot named '{}' was declared", slot),
                format!("Declared slots: {}", available.join(", ")),
            ],
            Self::AlreadyInstalled { plugin } => vec![
                format!("'{}' was registered twice", plugin),
                "Remove the duplicate plugin entry".into(),
            ],
            Self::ListenerFailure { event, .. } => vec![
                format!("A plugin listening to '{}' failed", event),
                "Run with -v for the plugin's own diagnostics".into(),
            ],
            Self::StepFailure { slot, .. } => vec![
                format!("A plugin step in '{}' failed", slot),
                "Run with -v for the plugin's own diagnostics".into(),
            ],
            Self::PluginResolution { package, .. } => vec![
                format!("Make sure '{}' is listed in the project's package.json", package),
                "Try: plinth plugins to see available plugins".into(),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownSlot { .. } | Self::AlreadyInstalled { .. } => ErrorCategory::Validation,
            Self::PluginResolution { .. } => ErrorCategory::NotFound,
            Self::ListenerFailure { .. } | Self::StepFailure { .. } => ErrorCategory::External,
        }
    }

    /// Event, slot or plugin the error is attributed to.
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::UnknownSlot { slot, .. } => Some(slot),
            Self::AlreadyInstalled { plugin } => Some(plugin),
            Self::ListenerFailure { event, .. } => Some(event),
            Self::StepFailure { slot, .. } => Some(slot),
            Self::PluginResolution { module, .. } => Some(module),
        }
    }
}
