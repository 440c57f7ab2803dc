//! The host application.
//!
//! An [`App`] owns the emitter and middleware collection of one run, keeps
//! the plugin hooks in the order they were added and installs each exactly
//! once. Commands then drive the lifecycle through [`App::emit`] and
//! [`App::run`].

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::ports::PluginLoader,
    domain::{
        AppContext, DefaultEvents, EventEmitter, Events, HookError, InstallState,
        MarketplacePlugin, MiddlewareCollection, PluginHook, RunOutcome,
    },
};

/// A plugin to resolve through a [`PluginLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct PluginRequest {
    pub package: String,
    pub module: String,
    /// User configuration deep-merged over the plugin's defaults.
    pub overrides: Value,
}

impl PluginRequest {
    pub fn new(package: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            module: module.into(),
            overrides: Value::Null,
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Value) -> Self {
        self.overrides = overrides;
        self
    }

    /// Request for the CLI-side hook of a marketplace plugin, if it has one.
    pub fn cli_hook(plugin: &MarketplacePlugin) -> Option<Self> {
        plugin
            .cli_module
            .as_ref()
            .map(|module| Self::new(plugin.package.clone(), module.clone()))
    }
}

/// A plugin that could not be loaded or installed.
#[derive(Debug)]
pub struct FailedPlugin {
    pub name: String,
    pub error: HookError,
    /// Listeners and steps the plugin registered before failing; they were
    /// removed again.
    pub discarded: usize,
}

/// Outcome of [`App::install`] and [`App::install_all`].
#[derive(Debug, Default)]
pub struct InstallReport {
    /// Names of hooks installed by this call, in installation order.
    pub installed: Vec<String>,
    /// Plugins dropped by this call.
    pub failed: Vec<FailedPlugin>,
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn absorb(&mut self, other: InstallReport) {
        self.installed.extend(other.installed);
        self.failed.extend(other.failed);
    }
}

struct Entry<E: Events> {
    hook: Box<dyn PluginHook<E>>,
    state: InstallState,
}

/// Host of the plugin lifecycle.
pub struct App<E: Events = DefaultEvents> {
    context: AppContext<E>,
    plugins: Vec<Entry<E>>,
}

impl<E: Events> App<E> {
    /// Create an app whose middleware collection has the default slots.
    pub fn new() -> Self {
        Self::with_middleware(MiddlewareCollection::with_default_slots())
    }

    /// Create an app with exactly the given middleware slots.
    pub fn with_slots<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_middleware(MiddlewareCollection::new(slots))
    }

    fn with_middleware(middleware: MiddlewareCollection<E::Payload>) -> Self {
        Self {
            context: AppContext::new(Arc::new(EventEmitter::new()), Arc::new(middleware)),
            plugins: Vec::new(),
        }
    }

    /// Shared hook machinery handed to every plugin.
    pub fn context(&self) -> &AppContext<E> {
        &self.context
    }

    /// Add a hook. It is installed by the next [`App::install`].
    ///
    /// Fails with [`HookError::AlreadyInstalled`] if a hook with the same
    /// name was already added.
    pub fn use_plugin(&mut self, hook: Box<dyn PluginHook<E>>) -> Result<&mut Self, HookError> {
        if self.plugins.iter().any(|e| e.hook.name() == hook.name()) {
            return Err(HookError::AlreadyInstalled {
                plugin: hook.name().to_string(),
            });
        }
        debug!(plugin = hook.name(), "Plugin added");
        self.plugins.push(Entry {
            hook,
            state: InstallState::Uninstalled,
        });
        Ok(self)
    }

    /// Resolve `request` through `loader`, apply its overrides and add it.
    pub fn load_plugin(
        &mut self,
        loader: &dyn PluginLoader<E>,
        project_path: &Path,
        request: &PluginRequest,
    ) -> Result<(), HookError> {
        let mut hook = loader.load(project_path, &request.package, &request.module)?;
        hook.configure(&request.overrides);
        self.use_plugin(hook)?;
        Ok(())
    }

    /// Install every hook that is not installed yet, in the order added.
    ///
    /// Disabled hooks (`"enabled": false`) stay uninstalled. A hook whose
    /// install fails is removed and reported, together with any listener
    /// or step it registered on the way; the others still install.
    #[instrument(skip_all)]
    pub fn install(&mut self) -> InstallReport {
        let mut report = InstallReport::default();
        let context = self.context.clone();

        self.plugins.retain_mut(|entry| {
            if entry.state == InstallState::Installed {
                return true;
            }
            let name = entry.hook.name().to_string();
            if !entry.hook.config().is_enabled() {
                debug!(plugin = %name, "Plugin disabled, skipping install");
                return true;
            }

            let checkpoint = context.checkpoint();
            match entry.hook.install(&context) {
                Ok(()) => {
                    entry.state = InstallState::Installed;
                    debug!(plugin = %name, "Plugin installed");
                    report.installed.push(name);
                    true
                }
                Err(error) => {
                    let discarded = context.rollback(checkpoint);
                    warn!(plugin = %name, error = %error, discarded, "Plugin install failed");
                    report.failed.push(FailedPlugin {
                        name,
                        error,
                        discarded,
                    });
                    false
                }
            }
        });

        info!(
            installed = report.installed.len(),
            failed = report.failed.len(),
            "Plugins installed"
        );
        report
    }

    /// Load every request through `loader`, then install.
    ///
    /// Resolution failures are isolated per plugin and reported alongside
    /// install failures.
    pub fn install_all(
        &mut self,
        loader: &dyn PluginLoader<E>,
        project_path: &Path,
        requests: &[PluginRequest],
    ) -> InstallReport {
        let mut report = InstallReport::default();
        for request in requests {
            if let Err(error) = self.load_plugin(loader, project_path, request) {
                warn!(package = %request.package, module = %request.module, error = %error, "Plugin not loaded");
                report.failed.push(FailedPlugin {
                    name: request.module.clone(),
                    error,
                    discarded: 0,
                });
            }
        }
        report.absorb(self.install());
        report
    }

    /// Emit `event` to every registered listener.
    pub async fn emit(&self, event: &str, payload: &mut E::Payload) -> Result<(), HookError> {
        self.context.emitter().emit(event, payload).await
    }

    /// Run every step of `slot`.
    pub async fn run(&self, slot: &str, payload: &mut E::Payload) -> Result<RunOutcome, HookError> {
        self.context.middleware().run(slot, payload).await
    }

    /// Installation state of the hook named `name`.
    pub fn state_of(&self, name: &str) -> Option<InstallState> {
        self.plugins
            .iter()
            .find(|e| e.hook.name() == name)
            .map(|e| e.state)
    }

    /// Hooks in the order they were added.
    pub fn plugins(&self) -> impl Iterator<Item = &dyn PluginHook<E>> {
        self.plugins.iter().map(|e| e.hook.as_ref())
    }
}

impl<E: Events> Default for App<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Events> std::fmt::Debug for App<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plugins: Vec<(&str, InstallState)> =
            self.plugins.iter().map(|e| (e.hook.name(), e.state)).collect();
        f.debug_struct("App")
            .field("context", &self.context)
            .field("plugins", &plugins)
            .finish()
    }
}
