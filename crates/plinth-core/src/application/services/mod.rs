//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports for the steps commands
//! are built from: looking up marketplace plugins and creating projects.

pub mod marketplace_service;
pub mod project_service;

pub use marketplace_service::{ALEXA_PACKAGE, LAMBDA_PACKAGE, MarketplaceService};
pub use project_service::ProjectService;
