use std::path::Path;

use async_trait::async_trait;
use plinth_core::{
    application::{ApplicationError, ports::TemplateFetcher},
    domain::{DEFAULT_TEMPLATE_OWNER, TemplateLanguage},
    error::CoreResult,
};
use tracing::{info, instrument};

use crate::{NEW_COMMAND_MODULE, process};

/// Fetches the official template with a shallow `git clone`.
///
/// The clone's `.git` directory is removed afterwards so the new project
/// starts without the template's history.
#[derive(Debug, Clone)]
pub struct GitTemplateFetcher {
    owner: String,
    host: String,
}

impl GitTemplateFetcher {
    pub fn new() -> Self {
        Self::with_owner(DEFAULT_TEMPLATE_OWNER)
    }

    /// Fetch templates published by `owner` instead of the default one.
    pub fn with_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            host: "https://github.com".into(),
        }
    }

    /// Clone URL of the template for `language`.
    pub fn url(&self, language: TemplateLanguage) -> String {
        format!("{}/{}.git", self.host, language.repository(&self.owner))
    }
}

impl Default for GitTemplateFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateFetcher for GitTemplateFetcher {
    #[instrument(skip(self), fields(target = %target_dir.display()))]
    async fn fetch(&self, target_dir: &Path, language: TemplateLanguage) -> CoreResult<()> {
        let url = self.url(language);
        let target = target_dir.to_string_lossy();
        let repository = language.repository(&self.owner);

        process::run(
            NEW_COMMAND_MODULE,
            "git",
            &["clone", "--depth", "1", "--quiet", url.as_str(), &*target],
            None,
        )
        .await
        .map_err(|e| ApplicationError::TemplateFetch {
            repository: repository.clone(),
            reason: e.stderr,
        })?;

        let git_dir = target_dir.join(".git");
        if tokio::fs::try_exists(&git_dir).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&git_dir)
                .await
                .map_err(|e| ApplicationError::Filesystem {
                    path: git_dir.clone(),
                    reason: format!("Failed to remove template history: {e}"),
                })?;
        }

        info!(%repository, "Template cloned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_follows_language_repository() {
        let fetcher = GitTemplateFetcher::new();
        assert_eq!(
            fetcher.url(TemplateLanguage::TypeScript),
            "https://github.com/jovotech/jovo-v4-template.git"
        );
        assert_eq!(
            GitTemplateFetcher::with_owner("acme").url(TemplateLanguage::JavaScript),
            "https://github.com/acme/jovo-v4-template-js.git"
        );
    }
}
