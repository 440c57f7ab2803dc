use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use plinth_core::{
    application::ports::PluginLoader,
    domain::{DefaultEvents, Events, HookError, PluginHook},
};
use tracing::debug;

/// Constructor of a registered hook.
pub type HookFactory<E> = Arc<dyn Fn() -> Box<dyn PluginHook<E>> + Send + Sync>;

/// Registry of hooks compiled into the binary.
pub struct StaticPluginLoader<E: Events = DefaultEvents> {
    factories: HashMap<(String, String), HookFactory<E>>,
}

impl<E: Events> StaticPluginLoader<E> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register the hook exported as `module` by `package`. A later
    /// registration of the same pair replaces the earlier one.
    pub fn register<F>(&mut self, package: impl Into<String>, module: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn PluginHook<E>> + Send + Sync + 'static,
    {
        self.factories
            .insert((package.into(), module.into()), Arc::new(factory));
        self
    }

    /// Builder form of [`StaticPluginLoader::register`].
    #[must_use]
    pub fn with<F>(mut self, package: impl Into<String>, module: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn PluginHook<E>> + Send + Sync + 'static,
    {
        self.register(package, module, factory);
        self
    }

    pub fn contains(&self, package: &str, module: &str) -> bool {
        self.factories
            .contains_key(&(package.to_string(), module.to_string()))
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<E: Events> Default for StaticPluginLoader<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Events> std::fmt::Debug for StaticPluginLoader<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.factories.keys().collect();
        keys.sort();
        f.debug_struct("StaticPluginLoader")
            .field("plugins", &keys)
            .finish()
    }
}

impl<E: Events> PluginLoader<E> for StaticPluginLoader<E> {
    fn load(
        &self,
        _project_path: &Path,
        package: &str,
        module: &str,
    ) -> Result<Box<dyn PluginHook<E>>, HookError> {
        let key = (package.to_string(), module.to_string());
        let factory = self
            .factories
            .get(&key)
            .ok_or_else(|| HookError::PluginResolution {
                package: package.to_string(),
                module: module.to_string(),
                reason: "no such plugin is built into this binary".into(),
            })?;

        debug!(package, module, "Plugin loaded from static registry");
        Ok(factory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plinth_core::domain::{AppContext, Plugin, PluginComponent, PluginConfig};

    struct Noop(PluginComponent);

    impl Plugin for Noop {
        fn component(&self) -> &PluginComponent {
            &self.0
        }
        fn component_mut(&mut self) -> &mut PluginComponent {
            &mut self.0
        }
    }

    impl PluginHook for Noop {
        fn install(&mut self, _ctx: &AppContext) -> Result<(), HookError> {
            Ok(())
        }
    }

    fn noop() -> Box<dyn PluginHook> {
        Box::new(Noop(PluginComponent::new("Noop", PluginConfig::new())))
    }

    #[test]
    fn registered_hooks_are_instantiated_fresh() {
        let loader = StaticPluginLoader::new().with("@acme/noop", "Noop", noop);

        let first = loader.load(Path::new("."), "@acme/noop", "Noop").unwrap();
        let second = loader.load(Path::new("."), "@acme/noop", "Noop").unwrap();

        assert_eq!(first.name(), "Noop");
        assert_eq!(second.name(), "Noop");
        assert!(loader.contains("@acme/noop", "Noop"));
        assert_eq!(loader.len(), 1);
    }

    #[test]
    fn unknown_module_is_a_resolution_error() {
        let loader = StaticPluginLoader::new().with("@acme/noop", "Noop", noop);

        let err = loader
            .load(Path::new("."), "@acme/noop", "Other")
            .err()
            .unwrap();
        assert!(matches!(
            err,
            HookError::PluginResolution { ref module, .. } if module == "Other"
        ));
    }
}
