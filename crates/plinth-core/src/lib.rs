//! Plinth Core - plugin, event and middleware machinery
//!
//! This crate provides the domain and application layers for the Plinth
//! scaffolding tool, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           plinth-cli (CLI)              │
//! │   (commands are installed as hooks)     │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     Application (App host, Services)    │
//! │  (App, MarketplaceService, Project...)  │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (PluginLoader, Marketplace, Fetcher...) │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    plinth-adapters (Infrastructure)     │
//! │ (StaticPluginLoader, NpmInstaller, etc) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (EventEmitter, MiddlewareCollection,    │
//! │  Plugin, PluginHook, MarketplacePlugin) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use plinth_core::prelude::*;
//!
//! # async fn demo(mut app: App, hook: Box<dyn PluginHook>) -> CoreResult<()> {
//! // 1. Register plugins, then install them once
//! app.use_plugin(hook)?;
//! app.install();
//!
//! // 2. Drive the lifecycle
//! let mut ctx = CommandContext::new("new", "./my-app");
//! app.emit("before.new", &mut ctx).await?;
//! app.run("new", &mut ctx).await?;
//! app.emit("after.new", &mut ctx).await?;
//! # Ok(())
//! # }
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        App, ExternalProcessError, InstallReport, MarketplaceService, PluginRequest, ProjectService,
        ports::{Marketplace, PackageInstaller, PluginLoader, TemplateFetcher},
    };
    pub use crate::domain::{
        AppContext, BoxFuture, CommandContext, DefaultEvents, EventEmitter, EventName, Events,
        HookError, InitConfig, InstallState, ListenerId, MarketplacePlugin, MiddlewareCollection,
        Plugin, PluginComponent, PluginConfig, PluginHook, RunOutcome, StepOutcome, Tags,
        TemplateLanguage,
    };
    pub use crate::error::{CoreError, CoreResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
