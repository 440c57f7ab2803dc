//! CLI-side hooks of marketplace plugins, compiled into the binary.

use serde_json::{Map, Value, json};

use plinth_adapters::StaticPluginLoader;
use plinth_core::application::ALEXA_PACKAGE;
use plinth_core::domain::{
    AppContext, CommandContext, HookError, InitConfig, Plugin, PluginComponent, PluginConfig,
    PluginHook,
};

/// Module exported by the Alexa platform for the CLI.
pub const ALEXA_CLI_MODULE: &str = "AlexaCli";

/// Every CLI hook this build knows about.
pub fn builtin_loader() -> StaticPluginLoader {
    StaticPluginLoader::new().with(ALEXA_PACKAGE, ALEXA_CLI_MODULE, || Box::new(AlexaCli::new()))
}

/// CLI hook of the Amazon Alexa platform.
///
/// Contributes the platform's init config to the generated app and a
/// follow-up note once the project exists.
pub struct AlexaCli {
    component: PluginComponent,
}

impl AlexaCli {
    pub fn new() -> Self {
        let defaults = PluginConfig::try_from(json!({ "askProfile": "default" })).unwrap_or_default();
        Self {
            component: PluginComponent::new(ALEXA_CLI_MODULE, defaults),
        }
    }
}

impl Default for AlexaCli {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for AlexaCli {
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

impl InitConfig for AlexaCli {
    fn init_config(&self) -> Map<String, Value> {
        let mut intents = Map::new();
        intents.insert("AMAZON.StopIntent".into(), json!("END"));
        intents.insert("AMAZON.CancelIntent".into(), json!("END"));

        let mut config = Map::new();
        config.insert("intentMap".into(), Value::Object(intents));
        config
    }
}

impl PluginHook for AlexaCli {
    fn install(&mut self, ctx: &AppContext) -> Result<(), HookError> {
        let profile = self
            .config()
            .get("askProfile")
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string();

        ctx.emitter().on("after.new", move |cmd: &mut CommandContext| {
            let message = format!(
                "Alexa: link the skill to your ASK CLI profile '{profile}' before deploying"
            );
            Box::pin(async move {
                cmd.note(message);
                Ok(())
            })
        });
        Ok(())
    }
}
