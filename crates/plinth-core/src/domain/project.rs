//! Splicing selected plugins into a freshly fetched project.

use serde_json::{Map, Value};

use crate::domain::{
    common::insert, marketplace::MarketplacePlugin, value_objects::TemplateLanguage,
};

/// Version range written to `package.json` for marketplace plugins.
pub const PLUGIN_VERSION_RANGE: &str = "^4.0.0";

/// Marker opening the plugin list in the generated app config.
pub const PLUGINS_MARKER: &str = "plugins: [";

/// A plugin to register in the app config, with its rendered init config
/// (see `format_init_config`). An empty init config renders as `new M()`.
#[derive(Debug, Clone)]
pub struct PluginRegistration<'a> {
    pub plugin: &'a MarketplacePlugin,
    pub init_config: String,
}

impl<'a> PluginRegistration<'a> {
    pub fn new(plugin: &'a MarketplacePlugin) -> Self {
        Self {
            plugin,
            init_config: String::new(),
        }
    }

    #[must_use]
    pub fn with_init_config(mut self, init_config: impl Into<String>) -> Self {
        self.init_config = init_config.into();
        self
    }

    fn import_line(&self, language: TemplateLanguage) -> String {
        let module = &self.plugin.module;
        let package = &self.plugin.package;
        match language {
            TemplateLanguage::TypeScript => format!("import {{ {module} }} from '{package}';\n"),
            TemplateLanguage::JavaScript => {
                format!("const {{ {module} }} = require('{package}');\n")
            }
        }
    }

    fn instance(&self) -> String {
        format!("\n\t\tnew {}({}),", self.plugin.module, self.init_config)
    }
}

/// Add imports and instances for `plugins` to an app config source.
///
/// Imports go to the top of the file; instances are appended right after
/// [`PLUGINS_MARKER`], keeping the given order. Returns `None` when the
/// source has no plugin list.
pub fn register_plugins(
    source: &str,
    plugins: &[PluginRegistration<'_>],
    language: TemplateLanguage,
) -> Option<String> {
    let marker = source.find(PLUGINS_MARKER)? + PLUGINS_MARKER.len();
    if plugins.is_empty() {
        return Some(source.to_string());
    }

    let instances: String = plugins.iter().map(PluginRegistration::instance).collect();
    let with_instances = insert(&instances, source, marker);

    let imports: String = plugins.iter().map(|p| p.import_line(language)).collect();
    Some(insert(&imports, &with_instances, 0))
}

/// Add every plugin package to the `dependencies` of a `package.json`
/// document. Existing entries keep their version. Returns the number of
/// packages added.
pub fn add_dependencies(manifest: &mut Value, plugins: &[&MarketplacePlugin]) -> usize {
    let Some(root) = manifest.as_object_mut() else {
        return 0;
    };
    let dependencies = root
        .entry("dependencies")
        .or_insert_with(|| Value::Object(Map::new()));
    if !dependencies.is_object() {
        *dependencies = Value::Object(Map::new());
    }
    let Some(dependencies) = dependencies.as_object_mut() else {
        return 0;
    };

    let mut added = 0;
    for plugin in plugins {
        if !dependencies.contains_key(&plugin.package) {
            dependencies.insert(
                plugin.package.clone(),
                Value::String(PLUGIN_VERSION_RANGE.to_string()),
            );
            added += 1;
        }
    }
    added
}
