//! Child process runner shared by the git and npm adapters.

use std::path::Path;
use std::process::Stdio;

use plinth_core::application::ExternalProcessError;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Run `program` with `args` in `cwd` and wait for it.
///
/// Returns captured stdout on success. A spawn failure or a non-zero exit
/// becomes an [`ExternalProcessError`] tagged with `module`, carrying the
/// process's stderr.
#[instrument(level = "debug")]
pub async fn run(
    module: &str,
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<String, ExternalProcessError> {
    let command_line = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let output = command
        .output()
        .await
        .map_err(|e| ExternalProcessError::new(module, &command_line, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = if stderr.trim().is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr.into_owned()
        };
        return Err(ExternalProcessError::new(module, &command_line, stderr));
    }

    debug!(command = %command_line, "Process finished");
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
