//! End-to-end lifecycle tests for plinth-core.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use plinth_core::application::ApplicationError;
use plinth_core::domain::{StepOutcome, format_init_config};
use plinth_core::prelude::*;
use serde_json::{Map, Value, json};

// ============================================================================
// Fixtures
// ============================================================================

struct Trace;

impl Events for Trace {
    type Payload = Vec<String>;
    const NAMES: &'static [&'static str] = &["init", "validate"];
}

fn push_a(log: &mut Vec<String>) -> BoxFuture<'_, anyhow::Result<()>> {
    Box::pin(async move {
        log.push("a".into());
        Ok(())
    })
}

fn push_b(log: &mut Vec<String>) -> BoxFuture<'_, anyhow::Result<()>> {
    Box::pin(async move {
        log.push("b".into());
        Ok(())
    })
}

fn reject(_log: &mut Vec<String>) -> BoxFuture<'_, anyhow::Result<StepOutcome>> {
    Box::pin(async move { Ok(StepOutcome::Halt) })
}

fn record(log: &mut Vec<String>) -> BoxFuture<'_, anyhow::Result<StepOutcome>> {
    Box::pin(async move {
        log.push("validated".into());
        Ok(StepOutcome::Continue)
    })
}

/// Hook that greets after a project was created and exposes an init config.
struct Welcome {
    component: PluginComponent,
}

impl Welcome {
    fn new() -> Self {
        let defaults = PluginConfig::try_from(json!({ "greeting": "Happy building" }))
            .unwrap_or_default();
        Self {
            component: PluginComponent::new("Welcome", defaults),
        }
    }
}

impl Plugin for Welcome {
    fn component(&self) -> &PluginComponent {
        &self.component
    }
    fn component_mut(&mut self) -> &mut PluginComponent {
        &mut self.component
    }
    fn init_config(&self) -> Option<&dyn InitConfig> {
        Some(self)
    }
}

impl InitConfig for Welcome {
    fn init_config(&self) -> Map<String, Value> {
        let mut config = Map::new();
        config.insert("greeting".into(), json!(""));
        config
    }
}

impl PluginHook for Welcome {
    fn install(&mut self, ctx: &AppContext) -> Result<(), HookError> {
        let greeting = self
            .config()
            .get("greeting")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        ctx.emitter().on("after.new", move |cmd: &mut CommandContext| {
            let message = format!("{greeting}, {}!", cmd.project_dir().display());
            Box::pin(async move {
                cmd.note(message);
                Ok(())
            })
        });
        Ok(())
    }
}

// ============================================================================
// Emitter and middleware scenarios
// ============================================================================

#[tokio::test]
async fn init_listeners_fire_in_order() {
    let emitter = EventEmitter::<Trace>::new();
    emitter.on("init", push_a);
    emitter.on("init", push_b);

    let mut log = Vec::new();
    emitter.emit("init", &mut log).await.unwrap();

    assert_eq!(log, vec!["a", "b"]);
}

#[tokio::test]
async fn validate_halt_skips_later_steps() {
    let app = App::<Trace>::with_slots(["validate"]);
    app.context().middleware().use_step("validate", reject).unwrap();
    app.context().middleware().use_step("validate", record).unwrap();

    let mut log = Vec::new();
    let outcome = app.run("validate", &mut log).await.unwrap();

    assert!(outcome.is_halted());
    assert!(log.is_empty());
}

#[test]
fn registering_on_unknown_slot_fails_synchronously() {
    let app = App::<Trace>::with_slots(["validate"]);
    let err = app.context().middleware().use_step("build", record).unwrap_err();
    assert!(matches!(err, HookError::UnknownSlot { ref slot, .. } if slot == "build"));
}

// ============================================================================
// Plugin lifecycle
// ============================================================================

#[tokio::test]
async fn installed_plugin_reacts_to_after_new() {
    let mut app = App::<DefaultEvents>::new();
    let mut hook = Welcome::new();
    hook.configure(&json!({ "greeting": "Welcome" }));
    app.use_plugin(Box::new(hook)).unwrap();

    let report = app.install();
    assert_eq!(report.installed, vec!["Welcome"]);

    let mut ctx = CommandContext::new("new", "voice-app");
    app.emit("before.new", &mut ctx).await.unwrap();
    app.run("new", &mut ctx).await.unwrap();
    app.emit("after.new", &mut ctx).await.unwrap();

    assert_eq!(ctx.notes, vec!["Welcome, voice-app!"]);
}

#[test]
fn init_config_is_rendered_for_display() {
    let hook = Welcome::new();
    assert_eq!(format_init_config(&hook), "{\n\t\t  \"greeting\": \"\"\n\t\t}");
}

// ============================================================================
// Marketplace
// ============================================================================

struct Listing;

impl Marketplace for Listing {
    fn plugins(&self) -> CoreResult<Vec<MarketplacePlugin>> {
        let raw = json!([
            {
                "name": "Amazon Alexa",
                "module": "AlexaPlatform",
                "cliModule": "AlexaCli",
                "package": "@jovotech/platform-alexa",
                "description": "Build apps for Amazon Alexa",
                "tags": "platforms"
            },
            {
                "name": "AWS Lambda",
                "module": "lambda",
                "package": "@jovotech/server-lambda",
                "description": "Serverless hosting solution by AWS",
                "tags": "server"
            }
        ]);
        serde_json::from_value(raw).map_err(|e| CoreError::Internal {
            message: e.to_string(),
        })
    }
}

#[test]
fn marketplace_finds_alexa_platform() {
    let service = MarketplaceService::new(Arc::new(Listing));
    let alexa = service
        .find_by_package("@jovotech/platform-alexa")
        .unwrap()
        .unwrap();

    assert_eq!(alexa.tags.iter().collect::<Vec<_>>(), vec!["platforms"]);
    assert_eq!(alexa.cli_module.as_deref(), Some("AlexaCli"));
    assert_eq!(service.lambda_plugin().unwrap().unwrap().module, "lambda");
}

// ============================================================================
// Project service
// ============================================================================

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl TemplateFetcher for Recorder {
    async fn fetch(&self, target_dir: &Path, language: TemplateLanguage) -> CoreResult<()> {
        std::fs::create_dir_all(target_dir).map_err(|e| CoreError::Internal {
            message: e.to_string(),
        })?;
        self.calls.lock().unwrap().push(format!("fetch {language}"));
        Ok(())
    }
}

#[async_trait]
impl PackageInstaller for Recorder {
    async fn install(&self, _project_dir: &Path) -> CoreResult<()> {
        Err(ExternalProcessError::new("NewCommand", "npm install", "npm ERR! offline").into())
    }
}

#[tokio::test]
async fn non_empty_directory_needs_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("package.json"), "{}").unwrap();

    let recorder = Arc::new(Recorder::default());
    let service = ProjectService::new(recorder.clone(), recorder.clone());

    let err = service.prepare_directory(dir.path(), false).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Application(ApplicationError::ProjectExists { .. })
    ));

    service.prepare_directory(dir.path(), true).await.unwrap();
    assert!(!dir.path().exists());

    service
        .fetch_template(dir.path(), TemplateLanguage::JavaScript)
        .await
        .unwrap();
    assert_eq!(*recorder.calls.lock().unwrap(), vec!["fetch javascript"]);
}

#[tokio::test]
async fn installer_failure_keeps_module_tag() {
    let recorder = Arc::new(Recorder::default());
    let service = ProjectService::new(recorder.clone(), recorder);

    let err = service
        .install_dependencies(Path::new("."))
        .await
        .unwrap_err();

    assert_eq!(err.module(), Some("NewCommand"));
    assert!(err.to_string().contains("npm ERR! offline"));
}
