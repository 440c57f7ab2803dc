//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only ever sees the per-plugin
//! override objects.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables, `PLINTH__SECTION__KEY`
//! 3. Config file (`--config`, `.plinth.toml` in CWD, or the user config dir)
//! 4. Built-in defaults (always present)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use plinth_core::domain::{DEFAULT_TEMPLATE_OWNER, TemplateLanguage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Environment variable prefix.
const ENV_PREFIX: &str = "PLINTH";

/// Name of the project-local config file.
pub const LOCAL_CONFIG_FILE: &str = ".plinth.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default values for new projects.
    pub defaults: Defaults,
    /// Output settings.
    pub output: OutputConfig,
    /// Template settings.
    pub templates: TemplateConfig,
    /// Per-plugin config overrides, keyed by plugin name.
    pub plugins: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub language: TemplateLanguage,
    pub platforms: Vec<String>,
    pub server: Option<String>,
    pub skip_install: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    /// `auto`, `human`, `plain` or `json`.
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// GitHub owner of the template repositories.
    pub owner: String,
    /// Local directory to copy templates from instead of cloning.
    pub local_path: Option<PathBuf>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            owner: DEFAULT_TEMPLATE_OWNER.into(),
            local_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the config file, then environment.
    ///
    /// An explicit `config_file` must exist; the default locations are
    /// optional.
    pub fn load(config_file: Option<&Path>) -> CliResult<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::config_path(), false),
        };
        debug!(path = %path.display(), required, "Loading configuration");

        let defaults = Config::try_from(&Self::default()).map_err(config_error)?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Toml).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("defaults.platforms"),
            )
            .build()
            .and_then(|built| built.try_deserialize::<Self>())
            .map_err(config_error)
    }

    /// Path of the active configuration file.
    ///
    /// `.plinth.toml` in the current directory wins over the per-user file
    /// from `directories::ProjectDirs`.
    pub fn config_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return local;
        }
        Self::user_config_path().unwrap_or(local)
    }

    /// Per-user config file location, if the platform has one.
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "plinth", "plinth")
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Override object for `plugin`, or `null` when none is configured.
    ///
    /// Names compare case-insensitively since environment keys arrive
    /// lowercased.
    pub fn plugin_overrides(&self, plugin: &str) -> Value {
        self.plugins
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(plugin))
            .map(|(_, overrides)| overrides.clone())
            .unwrap_or(Value::Null)
    }

    /// Look up a dotted key such as `defaults.language`.
    pub fn get(&self, key: &str) -> Option<Value> {
        let root = serde_json::to_value(self).ok()?;
        key.split('.')
            .try_fold(&root, |node, part| node.get(part))
            .cloned()
    }

    /// Render as TOML, the format written by `plinth init`.
    pub fn to_toml(&self) -> CliResult<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Configuration {
            message: format!("Cannot serialise configuration: {e}"),
        })
    }
}

fn config_error(err: config::ConfigError) -> CliError {
    CliError::Configuration {
        message: err.to_string(),
    }
}
