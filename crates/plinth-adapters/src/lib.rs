//! Infrastructure adapters for Plinth.
//!
//! This crate implements the ports defined in `plinth-core::application::ports`.
//! It contains all external dependencies and I/O operations: the builtin
//! marketplace listing, plugin loaders, template fetchers and the package
//! installer.

pub mod installer;
pub mod loader;
pub mod marketplace;
pub mod process;
pub mod template;

// Re-export commonly used adapters
pub use installer::NpmInstaller;
pub use loader::{ManifestPluginLoader, StaticPluginLoader};
pub use marketplace::BuiltinMarketplace;
pub use template::{GitTemplateFetcher, LocalTemplateFetcher};

/// Module tag attached to failures of the project creation tools.
pub const NEW_COMMAND_MODULE: &str = "NewCommand";
