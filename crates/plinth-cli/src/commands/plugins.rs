//! Implementation of the `plinth plugins` command.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use plinth_adapters::{BuiltinMarketplace, ManifestPluginLoader};
use plinth_core::{
    application::{MarketplaceService, ports::PluginLoader},
    domain::{HookError, MarketplacePlugin, PluginHook, format_init_config},
};

use crate::{
    cli::{OutputFormat, PluginsArgs, PluginsFormat},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
    platforms::builtin_loader,
};

pub fn execute(args: PluginsArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let service = MarketplaceService::new(Arc::new(BuiltinMarketplace::new()));
    let plugins = match &args.tag {
        Some(tag) => service.by_tag(tag)?,
        None => service.list()?,
    };
    debug!(count = plugins.len(), tag = ?args.tag, "Marketplace listed");

    let hooks = if args.show_config {
        load_cli_hooks(&plugins, args.project.as_deref(), &config)
    } else {
        Vec::new()
    };

    // `--output-format json` asks for machine output everywhere.
    let format = if output.format() == OutputFormat::Json {
        PluginsFormat::Json
    } else {
        args.format
    };

    match format {
        PluginsFormat::Json => {
            let entries = plugins
                .iter()
                .map(|plugin| json_entry(plugin, find_hook(&hooks, plugin)))
                .collect();
            output.json(&Value::Array(entries))?;
        }
        PluginsFormat::Table => {
            if plugins.is_empty() {
                output.warning("No plugins match")?;
                return Ok(());
            }
            output.header("Marketplace Plugins:")?;
            for plugin in &plugins {
                output.print(&table_row(plugin))?;
                match find_hook(&hooks, plugin) {
                    Some(Ok(hook)) => {
                        let rendered = format_init_config(&**hook);
                        if !rendered.is_empty() {
                            output.print(&format!("      init config: {rendered}"))?;
                        }
                    }
                    Some(Err(error)) => output.warning(&format!("      {error}"))?,
                    None => {}
                }
            }
        }
    }

    Ok(())
}

type LoadedHook = (String, Result<Box<dyn PluginHook>, HookError>);

/// Load the CLI hook of every plugin that ships one, with configured
/// overrides applied. A `project` gates loading by its `package.json`.
fn load_cli_hooks(
    plugins: &[MarketplacePlugin],
    project: Option<&Path>,
    config: &AppConfig,
) -> Vec<LoadedHook> {
    let loader: Box<dyn PluginLoader> = match project {
        Some(_) => Box::new(ManifestPluginLoader::new(builtin_loader())),
        None => Box::new(builtin_loader()),
    };
    let project = project.unwrap_or(Path::new("."));

    plugins
        .iter()
        .filter_map(|plugin| {
            let module = plugin.cli_module.as_deref()?;
            let loaded = loader.load(project, &plugin.package, module).map(|mut hook| {
                hook.configure(&config.plugin_overrides(module));
                hook
            });
            Some((plugin.package.clone(), loaded))
        })
        .collect()
}

fn find_hook<'a>(
    hooks: &'a [LoadedHook],
    plugin: &MarketplacePlugin,
) -> Option<&'a Result<Box<dyn PluginHook>, HookError>> {
    hooks
        .iter()
        .find(|(package, _)| *package == plugin.package)
        .map(|(_, loaded)| loaded)
}

fn table_row(plugin: &MarketplacePlugin) -> String {
    format!(
        "  {:<20} {:<28} [{}]  {}",
        plugin.name, plugin.package, plugin.tags, plugin.description
    )
}

fn json_entry(
    plugin: &MarketplacePlugin,
    hook: Option<&Result<Box<dyn PluginHook>, HookError>>,
) -> Value {
    let mut entry = serde_json::to_value(plugin).unwrap_or(Value::Null);
    if let (Some(object), Some(loaded)) = (entry.as_object_mut(), hook) {
        let init_config = match loaded {
            Ok(hook) => hook
                .init_config()
                .map(|capability| Value::Object(capability.init_config()))
                .unwrap_or(Value::Null),
            Err(_) => Value::Null,
        };
        object.insert("initConfig".into(), init_config);
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::ALEXA_CLI_MODULE;
    use serde_json::json;

    fn all_plugins() -> Vec<MarketplacePlugin> {
        MarketplaceService::new(Arc::new(BuiltinMarketplace::new()))
            .list()
            .unwrap()
    }

    #[test]
    fn only_plugins_with_cli_module_are_loaded() {
        let hooks = load_cli_hooks(&all_plugins(), None, &AppConfig::default());
        assert_eq!(hooks.len(), 1);
        let (package, loaded) = &hooks[0];
        assert_eq!(package, "@jovotech/platform-alexa");
        assert_eq!(loaded.as_ref().unwrap().name(), ALEXA_CLI_MODULE);
    }

    #[test]
    fn project_without_dependency_gates_hook() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{ "dependencies": {} }"#).unwrap();

        let hooks = load_cli_hooks(&all_plugins(), Some(dir.path()), &AppConfig::default());
        assert!(matches!(
            hooks[0].1,
            Err(HookError::PluginResolution { .. })
        ));
    }

    #[test]
    fn overrides_are_applied_to_loaded_hooks() {
        let mut config = AppConfig::default();
        config
            .plugins
            .insert(ALEXA_CLI_MODULE.into(), json!({ "askProfile": "work" }));

        let hooks = load_cli_hooks(&all_plugins(), None, &config);
        let hook = hooks[0].1.as_ref().unwrap();
        assert_eq!(hook.config().get("askProfile"), Some(&json!("work")));
    }

    #[test]
    fn json_entry_adds_init_config_for_cli_plugins() {
        let plugins = all_plugins();
        let hooks = load_cli_hooks(&plugins, None, &AppConfig::default());

        let alexa = plugins.iter().find(|p| p.module == "AlexaPlatform").unwrap();
        let entry = json_entry(alexa, find_hook(&hooks, alexa));
        assert_eq!(entry["cliModule"], json!("AlexaCli"));
        assert!(entry["initConfig"]["intentMap"].is_object());

        let lambda = plugins.iter().find(|p| p.module == "lambda").unwrap();
        let entry = json_entry(lambda, find_hook(&hooks, lambda));
        assert!(entry.get("initConfig").is_none());
    }

    #[test]
    fn table_row_shows_tags() {
        let plugins = all_plugins();
        let filedb = plugins.iter().find(|p| p.module == "FileDb").unwrap();
        let row = table_row(filedb);
        assert!(row.contains("@jovotech/db-filedb"));
        assert!(row.contains("[databases]"));
    }
}
