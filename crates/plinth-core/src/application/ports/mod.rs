//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `plinth-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `PluginLoader`: Plugin hook resolution
//!   - `Marketplace`: Plugin listing
//!   - `TemplateFetcher`: Project template retrieval
//!   - `PackageInstaller`: Dependency installation

pub mod output;

pub use output::{Marketplace, PackageInstaller, PluginLoader, TemplateFetcher};
