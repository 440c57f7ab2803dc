//! Template fetcher adapters.

mod git;
mod local;

pub use git::GitTemplateFetcher;
pub use local::LocalTemplateFetcher;
