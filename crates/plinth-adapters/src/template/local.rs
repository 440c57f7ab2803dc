use std::path::{Path, PathBuf};

use async_trait::async_trait;
use plinth_core::{
    application::{ApplicationError, ports::TemplateFetcher},
    domain::{DEFAULT_TEMPLATE_OWNER, TemplateLanguage},
    error::{CoreError, CoreResult},
};
use tracing::{debug, instrument};
use walkdir::WalkDir;

/// Directories never copied out of a template tree.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

/// Copies a template from a directory on disk.
///
/// If `root` contains a sub-directory named after the language's template
/// repository (`jovo-v4-template`, `jovo-v4-template-js`) that one is used,
/// otherwise `root` itself is the template.
#[derive(Debug, Clone)]
pub struct LocalTemplateFetcher {
    root: PathBuf,
}

impl LocalTemplateFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the template for `language` is copied from.
    pub fn source_for(&self, language: TemplateLanguage) -> PathBuf {
        let repository = language.repository(DEFAULT_TEMPLATE_OWNER);
        let name = repository.rsplit('/').next().unwrap_or(&repository);
        let candidate = self.root.join(name);
        if candidate.is_dir() {
            candidate
        } else {
            self.root.clone()
        }
    }
}

#[async_trait]
impl TemplateFetcher for LocalTemplateFetcher {
    #[instrument(skip(self), fields(root = %self.root.display(), target = %target_dir.display()))]
    async fn fetch(&self, target_dir: &Path, language: TemplateLanguage) -> CoreResult<()> {
        let source = self.source_for(language);
        let target = target_dir.to_path_buf();

        let copied = tokio::task::spawn_blocking(move || copy_tree(&source, &target))
            .await
            .map_err(|e| CoreError::Internal {
                message: format!("template copy task failed: {e}"),
            })??;

        debug!(files = copied, "Template copied");
        Ok(())
    }
}

fn copy_tree(source: &Path, target: &Path) -> Result<usize, ApplicationError> {
    if !source.is_dir() {
        return Err(ApplicationError::TemplateFetch {
            repository: source.display().to_string(),
            reason: "template directory does not exist".into(),
        });
    }

    let walker = WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name)))
        });

    let mut copied = 0;
    for entry in walker {
        let entry = entry.map_err(|e| ApplicationError::Filesystem {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ApplicationError::Filesystem {
                path: entry.path().to_path_buf(),
                reason: e.to_string(),
            })?;
        let destination = target.join(relative);

        let io_error = |e: std::io::Error| ApplicationError::Filesystem {
            path: destination.clone(),
            reason: e.to_string(),
        };

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination).map_err(io_error)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &destination).map_err(io_error)?;
            copied += 1;
        }
    }
    Ok(copied)
}
