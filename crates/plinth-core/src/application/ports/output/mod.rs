//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `plinth-adapters` crate provides implementations.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::{DefaultEvents, Events, HookError, MarketplacePlugin, PluginHook, TemplateLanguage};
use crate::error::CoreResult;

/// Port for resolving a plugin hook by package and exported module.
///
/// Implemented by:
/// - `plinth_adapters::loader::StaticPluginLoader` (compiled-in registry)
/// - `plinth_adapters::loader::ManifestPluginLoader` (registry gated by
///   the project's `package.json`)
pub trait PluginLoader<E: Events = DefaultEvents>: Send + Sync {
    /// Instantiate the hook exported as `module` by `package`.
    ///
    /// Fails with [`HookError::PluginResolution`] when the plugin is unknown
    /// or not available to the project at `project_path`.
    fn load(
        &self,
        project_path: &Path,
        package: &str,
        module: &str,
    ) -> Result<Box<dyn PluginHook<E>>, HookError>;
}

/// Port for listing marketplace plugins.
///
/// Implemented by:
/// - `plinth_adapters::marketplace::BuiltinMarketplace`
pub trait Marketplace: Send + Sync {
    /// Every listed plugin, tags already normalised.
    fn plugins(&self) -> CoreResult<Vec<MarketplacePlugin>>;
}

/// Port for retrieving a project template into a directory.
///
/// Implemented by:
/// - `plinth_adapters::template::GitTemplateFetcher` (shallow git clone)
/// - `plinth_adapters::template::LocalTemplateFetcher` (copy of a local tree)
#[async_trait]
pub trait TemplateFetcher: Send + Sync {
    /// Populate `target_dir` with the template for `language`.
    async fn fetch(&self, target_dir: &Path, language: TemplateLanguage) -> CoreResult<()>;
}

/// Port for installing a project's package dependencies.
///
/// Implemented by:
/// - `plinth_adapters::installer::NpmInstaller`
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Install dependencies of the project at `project_dir`.
    async fn install(&self, project_dir: &Path) -> CoreResult<()>;
}
