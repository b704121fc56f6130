//! Running external command-line tools.

use deckcast_core::{Error, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

/// Run `program` with `args`, failing on spawn errors and non-zero exit.
pub(crate) async fn run_tool<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> Result<Output> {
    let tool = program.display().to_string();
    log::debug!("Running {}", tool);

    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::ExternalTool {
            tool: tool.clone(),
            message: if e.kind() == std::io::ErrorKind::NotFound {
                "executable not found; is it installed and on PATH?".to_string()
            } else {
                format!("failed to start: {}", e)
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::ExternalTool {
            tool,
            message: format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ),
        });
    }

    Ok(output)
}
