//! Core domain layer for Plinth.
//!
//! The hook machinery (events, middleware, plugin contracts) plus the small
//! pure helpers the commands build on. Nothing here touches the filesystem,
//! spawns processes or installs a tracing subscriber; I/O lives behind the
//! ports in the application layer.
//!
//! ## Invariants
//!
//! - **Sequential dispatch**: listeners and steps are awaited one at a time
//! - **Snapshot at start**: registrations made during an emit/run apply to
//!   the next call only
//! - **Declared slots**: steps can only be added to slots declared up front

pub mod common;
pub mod context;
pub mod error;
pub mod event;
pub mod marketplace;
pub mod middleware;
pub mod plugin;
pub mod project;
pub mod value_objects;

pub use common::insert;
pub use context::{AppContext, Checkpoint, CommandContext};
pub use error::HookError;
pub use event::{BoxFuture, DefaultEvents, EventEmitter, EventName, Events, ListenerId};
pub use marketplace::{MarketplacePlugin, Tags};
pub use middleware::{
    DEFAULT_PRIORITY, DEFAULT_SLOTS, MiddlewareCollection, RunOutcome, StepOutcome,
};
pub use plugin::{
    InitConfig, InstallState, Plugin, PluginComponent, PluginConfig, PluginHook,
    format_init_config,
};
pub use project::{PLUGIN_VERSION_RANGE, PluginRegistration, add_dependencies, register_plugins};
pub use value_objects::{DEFAULT_TEMPLATE_OWNER, TemplateLanguage, UnknownLanguage};
