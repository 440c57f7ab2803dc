//! Project Service - creates a project on disk.
//!
//! Wraps the template and installer ports with the directory checks every
//! caller needs: refuse to clobber an existing project unless asked to.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{PackageInstaller, TemplateFetcher},
    },
    domain::TemplateLanguage,
    error::CoreResult,
};

/// Service for project creation steps.
#[derive(Clone)]
pub struct ProjectService {
    fetcher: Arc<dyn TemplateFetcher>,
    installer: Arc<dyn PackageInstaller>,
}

impl ProjectService {
    pub fn new(fetcher: Arc<dyn TemplateFetcher>, installer: Arc<dyn PackageInstaller>) -> Self {
        Self { fetcher, installer }
    }

    /// Make sure `project_dir` can receive a new project.
    ///
    /// A missing or empty directory is fine. A non-empty one is an error
    /// unless `overwrite` is set, in which case it is removed.
    #[instrument(skip(self), fields(project_dir = %project_dir.display()))]
    pub async fn prepare_directory(&self, project_dir: &Path, overwrite: bool) -> CoreResult<()> {
        if !is_occupied(project_dir).await? {
            return Ok(());
        }
        if !overwrite {
            return Err(ApplicationError::ProjectExists {
                path: project_dir.to_path_buf(),
            }
            .into());
        }

        warn!("Removing existing project directory");
        tokio::fs::remove_dir_all(project_dir)
            .await
            .map_err(|e| filesystem_error(project_dir, &e))?;
        Ok(())
    }

    /// Fetch the template for `language` into `project_dir`.
    #[instrument(skip(self), fields(project_dir = %project_dir.display(), language = %language))]
    pub async fn fetch_template(&self, project_dir: &Path, language: TemplateLanguage) -> CoreResult<()> {
        self.fetcher.fetch(project_dir, language).await?;
        info!("Template fetched");
        Ok(())
    }

    /// Install package dependencies in `project_dir`.
    #[instrument(skip(self), fields(project_dir = %project_dir.display()))]
    pub async fn install_dependencies(&self, project_dir: &Path) -> CoreResult<()> {
        self.installer.install(project_dir).await?;
        info!("Dependencies installed");
        Ok(())
    }
}

impl std::fmt::Debug for ProjectService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectService").finish_non_exhaustive()
    }
}

async fn is_occupied(dir: &Path) -> CoreResult<bool> {
    match tokio::fs::read_dir(dir).await {
        Ok(mut entries) => Ok(entries
            .next_entry()
            .await
            .map_err(|e| filesystem_error(dir, &e))?
            .is_some()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(filesystem_error(dir, &e).into()),
    }
}

fn filesystem_error(path: &Path, err: &std::io::Error) -> ApplicationError {
    ApplicationError::Filesystem {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
