//! Plugin contracts.
//!
//! Every plugin embeds a [`PluginComponent`] (name + merged configuration)
//! and implements [`Plugin`]. Plugins that hook into the lifecycle also
//! implement [`PluginHook`], whose `install` is their single chance to
//! register listeners and middleware steps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    context::AppContext,
    error::HookError,
    event::{DefaultEvents, Events},
};

// ============================================================================
// Configuration
// ============================================================================

/// A plugin's configuration object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginConfig(Map<String, Value>);

impl PluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `defaults` with `overrides` deep-merged on top.
    pub fn merged(defaults: &PluginConfig, overrides: &Value) -> Self {
        let mut config = defaults.clone();
        config.merge(overrides);
        config
    }

    /// Deep-merge `overrides` into this configuration.
    ///
    /// Non-object overrides are ignored: a configuration is always an object.
    pub fn merge(&mut self, overrides: &Value) {
        if let Value::Object(overrides) = overrides {
            merge_objects(&mut self.0, overrides);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// JSON pointer lookup, e.g. `"/locales/en"`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let mut segments = pointer.strip_prefix('/')?.splitn(2, '/');
        let value = self.0.get(segments.next()?)?;
        match segments.next() {
            Some(rest) => value.pointer(&format!("/{rest}")),
            None => Some(value),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Plugins are enabled unless their configuration says `"enabled": false`.
    pub fn is_enabled(&self) -> bool {
        self.0.get("enabled").and_then(Value::as_bool).unwrap_or(true)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for PluginConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for PluginConfig {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Objects merge key by key; anything else (arrays included) is replaced.
pub fn deep_merge(target: &mut Value, overrides: &Value) {
    match (target, overrides) {
        (Value::Object(target), Value::Object(overrides)) => merge_objects(target, overrides),
        (target, overrides) => *target = overrides.clone(),
    }
}

fn merge_objects(target: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        match target.get_mut(key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

// ============================================================================
// Component
// ============================================================================

/// State every plugin carries: its name and merged configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginComponent {
    name: String,
    config: PluginConfig,
}

impl PluginComponent {
    pub fn new(name: impl Into<String>, defaults: PluginConfig) -> Self {
        Self {
            name: name.into(),
            config: defaults,
        }
    }

    /// Build a component whose configuration is `defaults` with
    /// `overrides` deep-merged on top.
    pub fn with_overrides(name: impl Into<String>, defaults: PluginConfig, overrides: &Value) -> Self {
        Self {
            name: name.into(),
            config: PluginConfig::merged(&defaults, overrides),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PluginConfig {
        &mut self.config
    }
}

/// Optional capability: a plugin that can describe the configuration a user
/// should start from.
pub trait InitConfig {
    fn init_config(&self) -> Map<String, Value>;
}

/// Base contract of every plugin.
pub trait Plugin: Send + Sync {
    fn component(&self) -> &PluginComponent;

    fn component_mut(&mut self) -> &mut PluginComponent;

    fn name(&self) -> &str {
        self.component().name()
    }

    fn config(&self) -> &PluginConfig {
        self.component().config()
    }

    fn config_mut(&mut self) -> &mut PluginConfig {
        self.component_mut().config_mut()
    }

    /// Deep-merge user overrides onto the current configuration.
    fn configure(&mut self, overrides: &Value) {
        self.config_mut().merge(overrides);
    }

    /// The [`InitConfig`] capability, if this plugin has one.
    fn init_config(&self) -> Option<&dyn InitConfig> {
        None
    }
}

/// A plugin that registers listeners and middleware steps.
///
/// `install` is a declaration phase: it may call `on`/`use_step` on the
/// context it receives, but must not emit events or run slots. The host
/// calls it at most once per instance.
pub trait PluginHook<E: Events = DefaultEvents>: Plugin {
    fn install(&mut self, ctx: &AppContext<E>) -> Result<(), HookError>;
}

/// Installation state tracked by the host for each hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Uninstalled,
    Installed,
}

/// Render a plugin's init config for display.
///
/// Returns an empty string when the plugin has no such capability or its
/// init config is empty. Continuation lines are indented with two tabs so
/// the block can be spliced into generated source.
pub fn format_init_config<P: Plugin + ?Sized>(plugin: &P) -> String {
    let Some(capability) = plugin.init_config() else {
        return String::new();
    };
    let config = capability.init_config();
    if config.is_empty() {
        return String::new();
    }

    serde_json::to_string_pretty(&Value::Object(config))
        .map(|raw| raw.replace('\n', "\n\t\t"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> PluginConfig {
        PluginConfig::try_from(value).unwrap()
    }

    #[test]
    fn nested_objects_are_deep_merged() {
        let defaults = config(json!({
            "server": { "port": 3000, "host": "localhost" },
            "debug": false,
        }));
        let merged = PluginConfig::merged(&defaults, &json!({ "server": { "port": 8080 } }));

        assert_eq!(
            merged.to_value(),
            json!({ "server": { "port": 8080, "host": "localhost" }, "debug": false })
        );
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let defaults = config(json!({ "locales": ["en-US", "de-DE"] }));
        let merged = PluginConfig::merged(&defaults, &json!({ "locales": ["fr-FR"] }));

        assert_eq!(merged.get("locales"), Some(&json!(["fr-FR"])));
    }

    #[test]
    fn scalars_replace_objects_and_vice_versa() {
        let mut value = json!({ "a": { "b": 1 }, "c": 2 });
        deep_merge(&mut value, &json!({ "a": "flat", "c": { "d": 3 } }));
        assert_eq!(value, json!({ "a": "flat", "c": { "d": 3 } }));
    }

    #[test]
    fn non_object_overrides_are_ignored() {
        let defaults = config(json!({ "a": 1 }));
        let merged = PluginConfig::merged(&defaults, &json!([1, 2, 3]));
        assert_eq!(merged, defaults);
    }

    #[test]
    fn enabled_defaults_to_true() {
        assert!(PluginConfig::new().is_enabled());
        assert!(!config(json!({ "enabled": false })).is_enabled());
    }

    #[test]
    fn pointer_reaches_nested_values() {
        let cfg = config(json!({ "locales": { "en": ["en-US"] }, "flat": 1 }));
        assert_eq!(cfg.pointer("/locales/en"), Some(&json!(["en-US"])));
        assert_eq!(cfg.pointer("/flat"), Some(&json!(1)));
        assert_eq!(cfg.pointer("/missing/x"), None);
        assert_eq!(cfg.pointer("flat"), None);
    }

    struct Bare(PluginComponent);

    impl Plugin for Bare {
        fn component(&self) -> &PluginComponent {
            &self.0
        }
        fn component_mut(&mut self) -> &mut PluginComponent {
            &mut self.0
        }
    }

    struct WithDefaults(PluginComponent);

    impl Plugin for WithDefaults {
        fn component(&self) -> &PluginComponent {
            &self.0
        }
        fn component_mut(&mut self) -> &mut PluginComponent {
            &mut self.0
        }
        fn init_config(&self) -> Option<&dyn InitConfig> {
            Some(self)
        }
    }

    impl InitConfig for WithDefaults {
        fn init_config(&self) -> Map<String, Value> {
            self.config().as_map().clone()
        }
    }

    #[test]
    fn format_init_config_is_empty_without_capability() {
        let plugin = Bare(PluginComponent::new("Bare", config(json!({ "a": 1 }))));
        assert_eq!(format_init_config(&plugin), "");
    }

    #[test]
    fn format_init_config_is_empty_for_empty_config() {
        let plugin = WithDefaults(PluginComponent::new("Empty", PluginConfig::new()));
        assert_eq!(format_init_config(&plugin), "");
    }

    #[test]
    fn format_init_config_indents_continuation_lines() {
        let plugin = WithDefaults(PluginComponent::new("Alexa", config(json!({ "skillId": "" }))));
        assert_eq!(format_init_config(&plugin), "{\n\t\t  \"skillId\": \"\"\n\t\t}");
    }

    #[test]
    fn configure_merges_user_overrides() {
        let mut plugin = Bare(PluginComponent::with_overrides(
            "Bare",
            config(json!({ "a": { "b": 1, "c": 2 } })),
            &json!({ "a": { "c": 3 } }),
        ));
        plugin.configure(&json!({ "d": true }));

        assert_eq!(plugin.name(), "Bare");
        assert_eq!(
            plugin.config().to_value(),
            json!({ "a": { "b": 1, "c": 3 }, "d": true })
        );
    }
}
