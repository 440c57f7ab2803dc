//! Application layer for Plinth.
//!
//! This layer contains:
//! - **App**: The host that owns the hook machinery and installs plugins
//! - **Services**: Use case orchestration (MarketplaceService, ProjectService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types

pub mod app;
pub mod error;
pub mod ports;
pub mod services;

pub use app::{App, FailedPlugin, InstallReport, PluginRequest};
pub use error::{ApplicationError, ExternalProcessError};
pub use services::{ALEXA_PACKAGE, LAMBDA_PACKAGE, MarketplaceService, ProjectService};
