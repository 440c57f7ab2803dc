//! Plugin loader adapters.
//!
//! Plugins are compiled into the binary and looked up by
//! `(package, module)`. The manifest loader additionally requires the
//! package to be a dependency of the project being worked on.

mod manifest;
mod static_registry;

pub use manifest::ManifestPluginLoader;
pub use static_registry::{HookFactory, StaticPluginLoader};
