use std::path::Path;

use async_trait::async_trait;
use plinth_core::{application::ports::PackageInstaller, error::CoreResult};
use tracing::{info, instrument};

use crate::{NEW_COMMAND_MODULE, process};

/// Runs `npm install` in the project directory.
///
/// npm's warnings are not surfaced; on failure its stderr becomes the
/// error message, tagged with the `NewCommand` module.
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    program: String,
}

impl NpmInstaller {
    pub fn new() -> Self {
        Self::with_program("npm")
    }

    /// Use another npm-compatible executable, e.g. `pnpm`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for NpmInstaller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PackageInstaller for NpmInstaller {
    #[instrument(skip(self), fields(program = %self.program, project = %project_dir.display()))]
    async fn install(&self, project_dir: &Path) -> CoreResult<()> {
        process::run(NEW_COMMAND_MODULE, &self.program, &["install"], Some(project_dir)).await?;
        info!("Dependencies installed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plinth_core::error::ErrorCategory;

    #[tokio::test]
    async fn failure_is_attributed_to_new_command() {
        let dir = tempfile::tempdir().unwrap();
        let err = NpmInstaller::with_program("plinth-missing-npm")
            .install(dir.path())
            .await
            .unwrap_err();

        assert_eq!(err.module(), Some("NewCommand"));
        assert_eq!(err.category(), ErrorCategory::External);
    }
}
