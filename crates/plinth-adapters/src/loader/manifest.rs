use std::path::Path;

use plinth_core::{
    application::ports::PluginLoader,
    domain::{DefaultEvents, Events, HookError, PluginHook},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::StaticPluginLoader;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default)]
    dev_dependencies: Map<String, Value>,
}

impl PackageManifest {
    fn declares(&self, package: &str) -> bool {
        self.dependencies.contains_key(package) || self.dev_dependencies.contains_key(package)
    }
}

/// Static registry gated by the project's `package.json`.
///
/// A plugin only loads if its package is listed under `dependencies` or
/// `devDependencies` of the project at `project_path`.
#[derive(Debug)]
pub struct ManifestPluginLoader<E: Events = DefaultEvents> {
    registry: StaticPluginLoader<E>,
}

impl<E: Events> ManifestPluginLoader<E> {
    pub fn new(registry: StaticPluginLoader<E>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StaticPluginLoader<E> {
        &self.registry
    }

    fn read_manifest(project_path: &Path, package: &str, module: &str) -> Result<PackageManifest, HookError> {
        let path = project_path.join("package.json");
        let resolution = |reason: String| HookError::PluginResolution {
            package: package.to_string(),
            module: module.to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| resolution(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| resolution(format!("invalid {}: {e}", path.display())))
    }
}

impl<E: Events> PluginLoader<E> for ManifestPluginLoader<E> {
    #[instrument(skip(self), fields(project = %project_path.display()))]
    fn load(
        &self,
        project_path: &Path,
        package: &str,
        module: &str,
    ) -> Result<Box<dyn PluginHook<E>>, HookError> {
        let manifest = Self::read_manifest(project_path, package, module)?;
        if !manifest.declares(package) {
            return Err(HookError::PluginResolution {
                package: package.to_string(),
                module: module.to_string(),
                reason: "package is not a dependency of the project".into(),
            });
        }

        debug!("Package declared in manifest");
        self.registry.load(project_path, package, module)
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

    fn loader() -> ManifestPluginLoader {
        ManifestPluginLoader::new(StaticPluginLoader::new().with("@acme/noop", "Noop", || {
            Box::new(Noop(PluginComponent::new("Noop", PluginConfig::new()))) as Box<dyn PluginHook>
        }))
    }

    #[test]
    fn dev_dependencies_count_as_declared() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{ "devDependencies": { "@acme/noop": "^1.0.0" } }"#,
        )
        .unwrap();

        let hook = loader().load(dir.path(), "@acme/noop", "Noop").unwrap();
        assert_eq!(hook.name(), "Noop");
    }

    #[test]
    fn undeclared_package_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{ "dependencies": {} }"#).unwrap();

        let err = loader().load(dir.path(), "@acme/noop", "Noop").err().unwrap();
        assert!(err.to_string().contains("not a dependency"));
    }

    #[test]
    fn missing_manifest_is_a_resolution_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader().load(dir.path(), "@acme/noop", "Noop").err().unwrap();
        assert!(matches!(err, HookError::PluginResolution { .. }));
    }
}
