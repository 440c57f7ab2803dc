//! Implementation of the `plinth new` command.
//!
//! The work is done by [`NewHook`], a plugin that registers its steps in the
//! `new` middleware slot. `execute` resolves the selected marketplace
//! plugins, installs the hooks and drives `before.new` → `new` → `after.new`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use plinth_adapters::{BuiltinMarketplace, GitTemplateFetcher, LocalTemplateFetcher, NpmInstaller};
use plinth_core::{
    application::{
        App, ApplicationError, InstallReport, MarketplaceService, PluginRequest, ProjectService,
        ports::TemplateFetcher,
    },
    domain::{
        AppContext, CommandContext, DefaultEvents, HookError, MarketplacePlugin, Plugin,
        PluginComponent, PluginConfig, PluginHook, PluginRegistration, RunOutcome, StepOutcome,
        TemplateLanguage, add_dependencies, format_init_config, register_plugins,
    },
    error::CoreError,
};

use crate::{
    cli::NewArgs,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
    platforms::builtin_loader,
};

/// Name under which [`NewHook`] is installed.
pub const NEW_HOOK: &str = "NewHook";

/// Tag of marketplace plugins that are servers rather than app plugins.
const SERVER_TAG: &str = "server";

/// A marketplace plugin chosen for the new project.
#[derive(Debug, Clone)]
pub struct SelectedPlugin {
    pub plugin: MarketplacePlugin,
    /// Rendered init config of the plugin's CLI hook; empty if it has none.
    pub init_config: String,
}

impl SelectedPlugin {
    pub fn new(plugin: MarketplacePlugin) -> Self {
        Self {
            plugin,
            init_config: String::new(),
        }
    }
}

/// Hook that creates the project.
///
/// Steps, in order: check the directory, fetch the template, register the
/// selected plugins, install dependencies. Reads the `language`, `overwrite`
/// and `skip-install` flags of the [`CommandContext`].
pub struct NewHook {
    component: PluginComponent,
    service: ProjectService,
    selected: Arc<[SelectedPlugin]>,
}

impl NewHook {
    pub fn new(service: ProjectService, selected: Vec<SelectedPlugin>) -> Self {
        Self {
            component: PluginComponent::new(NEW_HOOK, PluginConfig::new()),
            service,
            selected: selected.into(),
        }
    }
}

impl Plugin for NewHook {
    fn component(&self) -> &PluginComponent {
        &self.component
    }

    fn component_mut(&mut self) -> &mut PluginComponent {
        &mut self.component
    }
}

impl PluginHook for NewHook {
    fn install(&mut self, ctx: &AppContext) -> Result<(), HookError> {
        let middleware = ctx.middleware();

        let service = self.service.clone();
        middleware.use_step("new", move |cmd: &mut CommandContext| {
            let service = service.clone();
            Box::pin(async move { check_directory(&service, cmd).await })
        })?;

        let service = self.service.clone();
        middleware.use_step("new", move |cmd: &mut CommandContext| {
            let service = service.clone();
            Box::pin(async move { fetch_template(&service, cmd).await })
        })?;

        let selected = Arc::clone(&self.selected);
        middleware.use_step("new", move |cmd: &mut CommandContext| {
            let selected = Arc::clone(&selected);
            Box::pin(async move { register_selected(&selected, cmd).await })
        })?;

        let service = self.service.clone();
        middleware.use_step("new", move |cmd: &mut CommandContext| {
            let service = service.clone();
            Box::pin(async move { install_dependencies(&service, cmd).await })
        })?;

        Ok(())
    }
}

// ── Steps ─────────────────────────────────────────────────────────────────────

async fn check_directory(
    service: &ProjectService,
    cmd: &mut CommandContext,
) -> anyhow::Result<StepOutcome> {
    service
        .prepare_directory(cmd.project_dir(), cmd.flag_bool("overwrite"))
        .await?;
    Ok(StepOutcome::Continue)
}

async fn fetch_template(
    service: &ProjectService,
    cmd: &mut CommandContext,
) -> anyhow::Result<StepOutcome> {
    let language = language_of(cmd)?;
    service.fetch_template(cmd.project_dir(), language).await?;
    Ok(StepOutcome::Continue)
}

/// Splice app plugins into `src/app.{ts,js}` and add every selected package
/// to `package.json`.
async fn register_selected(
    selected: &[SelectedPlugin],
    cmd: &mut CommandContext,
) -> anyhow::Result<StepOutcome> {
    if selected.is_empty() {
        return Ok(StepOutcome::Continue);
    }
    let language = language_of(cmd)?;
    let project_dir = cmd.project_dir().to_path_buf();

    let registrations: Vec<_> = selected
        .iter()
        .filter(|s| !s.plugin.has_tag(SERVER_TAG))
        .map(|s| PluginRegistration::new(&s.plugin).with_init_config(s.init_config.clone()))
        .collect();

    if !registrations.is_empty() {
        let app_path = project_dir
            .join("src")
            .join(format!("app.{}", language.file_extension()));
        let source = read_file(&app_path).await?;
        match register_plugins(&source, &registrations, language) {
            Some(updated) => write_file(&app_path, updated).await?,
            None => {
                warn!(path = %app_path.display(), "No plugin list found in app config");
                cmd.note(format!(
                    "Could not find `plugins: [` in {}, add the plugins there by hand",
                    app_path.display()
                ));
            }
        }
    }

    let manifest_path = project_dir.join("package.json");
    let mut manifest: Value = serde_json::from_str(&read_file(&manifest_path).await?)
        .map_err(|e| filesystem_error(&manifest_path, e))?;
    let plugins: Vec<&MarketplacePlugin> = selected.iter().map(|s| &s.plugin).collect();
    let added = add_dependencies(&mut manifest, &plugins);

    let mut rendered = serde_json::to_string_pretty(&manifest)?;
    rendered.push('\n');
    write_file(&manifest_path, rendered).await?;
    debug!(added, "Plugin packages added to package.json");

    Ok(StepOutcome::Continue)
}

async fn install_dependencies(
    service: &ProjectService,
    cmd: &mut CommandContext,
) -> anyhow::Result<StepOutcome> {
    if cmd.flag_bool("skip-install") {
        let message = format!(
            "Dependencies were not installed, run `npm install` in {}",
            cmd.project_dir().display()
        );
        cmd.note(message);
        return Ok(StepOutcome::Continue);
    }
    service.install_dependencies(cmd.project_dir()).await?;
    Ok(StepOutcome::Continue)
}

fn language_of(cmd: &CommandContext) -> anyhow::Result<TemplateLanguage> {
    match cmd.flag_str("language") {
        Some(name) => Ok(name.parse()?),
        None => Ok(TemplateLanguage::default()),
    }
}

async fn read_file(path: &Path) -> Result<String, CoreError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| filesystem_error(path, e))
}

async fn write_file(path: &Path, contents: String) -> Result<(), CoreError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| filesystem_error(path, e))
}

fn filesystem_error(path: &Path, err: impl std::fmt::Display) -> CoreError {
    ApplicationError::Filesystem {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
    .into()
}

// ── Command ───────────────────────────────────────────────────────────────────

/// Execute the `plinth new` command.
#[instrument(skip_all, fields(directory = %args.directory.display()))]
pub async fn execute(args: NewArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let language = args
        .language
        .map(TemplateLanguage::from)
        .unwrap_or(config.defaults.language);
    let skip_install = args.skip_install || config.defaults.skip_install;

    let marketplace = MarketplaceService::new(Arc::new(BuiltinMarketplace::new()));
    let plugins = select_plugins(&marketplace, &args, &config)?;
    debug!(
        language = %language,
        plugins = ?plugins.iter().map(|p| p.package.as_str()).collect::<Vec<_>>(),
        "Selection resolved"
    );

    // CLI hooks of the selected plugins first, their init configs feed NewHook.
    let mut app = App::<DefaultEvents>::new();
    let requests: Vec<PluginRequest> = plugins
        .iter()
        .filter_map(PluginRequest::cli_hook)
        .map(|request| {
            let overrides = config.plugin_overrides(&request.module);
            request.with_overrides(overrides)
        })
        .collect();
    let report = app.install_all(&builtin_loader(), &args.directory, &requests);
    report_failures(&report, &output)?;

    let selected: Vec<SelectedPlugin> = plugins
        .into_iter()
        .map(|plugin| {
            let init_config = plugin
                .cli_module
                .as_deref()
                .and_then(|module| app.plugins().find(|hook| hook.name() == module))
                .map(|hook| format_init_config(hook))
                .unwrap_or_default();
            SelectedPlugin {
                plugin,
                init_config,
            }
        })
        .collect();

    let service = ProjectService::new(template_fetcher(&args, &config), Arc::new(NpmInstaller::new()));
    app.use_plugin(Box::new(NewHook::new(service, selected)))?;
    let report = app.install();
    if let Some(failed) = report.failed.into_iter().find(|f| f.name == NEW_HOOK) {
        return Err(failed.error.into());
    }

    let mut ctx = CommandContext::new("new", &args.directory)
        .with_arg("directory", args.directory.display().to_string())
        .with_flag("language", language.as_str())
        .with_flag("overwrite", args.overwrite)
        .with_flag("skip-install", skip_install);

    output.header(&format!("Creating project in {}...", args.directory.display()))?;
    info!(language = %language, "Project creation started");

    if create_project(&app, &mut ctx, &output).await?.is_halted() {
        output.warning("Project creation was stopped by a plugin")?;
        for note in &ctx.notes {
            output.info(note)?;
        }
        return Ok(());
    }
    info!("Project creation completed");

    output.success(&format!("Project created in {}", args.directory.display()))?;
    for note in &ctx.notes {
        output.info(note)?;
    }
    output.print("")?;
    output.print("Next steps:")?;
    output.print(&format!("  cd {}", args.directory.display()))?;
    if skip_install {
        output.print("  npm install")?;
    }

    Ok(())
}

/// Emit `before.new`, run the `new` slot, then emit `after.new`.
///
/// `after.new` fires for a halted run too; only a failure skips it.
async fn create_project(
    app: &App<DefaultEvents>,
    ctx: &mut CommandContext,
    output: &OutputManager,
) -> CliResult<RunOutcome> {
    app.emit("before.new", ctx).await?;

    let spinner = output.spinner("Setting up project");
    let outcome = app.run("new", ctx).await;
    spinner.finish_and_clear();
    let outcome = outcome?;
    if let RunOutcome::Halted { step } = outcome {
        warn!(step, "The new slot was halted");
    }

    app.emit("after.new", ctx).await?;
    Ok(outcome)
}

/// Resolve `--platform`/`--server` (or their configured defaults) against
/// the marketplace. Duplicates collapse; order follows the flags.
pub fn select_plugins(
    marketplace: &MarketplaceService,
    args: &NewArgs,
    config: &AppConfig,
) -> CliResult<Vec<MarketplacePlugin>> {
    let platforms = if args.platforms.is_empty() {
        &config.defaults.platforms
    } else {
        &args.platforms
    };
    let server = args.server.as_ref().or(config.defaults.server.as_ref());

    let mut selected: Vec<MarketplacePlugin> = Vec::new();
    for selector in platforms.iter().chain(server) {
        let plugin = marketplace
            .resolve(selector)?
            .ok_or_else(|| CliError::UnknownPlugin {
                selector: selector.clone(),
                available: short_names(marketplace),
            })?;
        if !selected.iter().any(|p| p.package == plugin.package) {
            selected.push(plugin);
        }
    }
    Ok(selected)
}

/// `alexa`, `lambda`, ...: the package suffixes accepted as selectors.
fn short_names(marketplace: &MarketplaceService) -> Vec<String> {
    marketplace
        .list()
        .unwrap_or_default()
        .iter()
        .filter_map(|p| p.package.rsplit('-').next().map(str::to_string))
        .collect()
}

fn template_fetcher(args: &NewArgs, config: &AppConfig) -> Arc<dyn TemplateFetcher> {
    let local: Option<PathBuf> = args
        .template_dir
        .clone()
        .or_else(|| config.templates.local_path.clone());
    match local {
        Some(root) => {
            debug!(root = %root.display(), "Using local template");
            Arc::new(LocalTemplateFetcher::new(root))
        }
        None => Arc::new(GitTemplateFetcher::with_owner(config.templates.owner.clone())),
    }
}

fn report_failures(report: &InstallReport, output: &OutputManager) -> CliResult<()> {
    for failed in &report.failed {
        output.warning(&format!("Plugin '{}' was skipped: {}", failed.name, failed.error))?;
    }
    Ok(())
}

// ── tests ─────────────────────────────────────────────────────────────────────
