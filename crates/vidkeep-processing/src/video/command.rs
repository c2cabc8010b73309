//! Shared plumbing for running external media tools.

use std::process::{Output, Stdio};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::ProcessingError;

/// Validate that a tool path doesn't contain shell metacharacters or traversal
pub(crate) fn validate_tool_path(path: &str) -> Result<(), ProcessingError> {
    if path.is_empty() {
        return Err(ProcessingError::InvalidToolPath(
            "tool path is empty".to_string(),
        ));
    }

    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ProcessingError::InvalidToolPath(format!(
            "path contains dangerous characters: {}",
            path
        )));
    }

    if path.contains("..") {
        return Err(ProcessingError::InvalidToolPath(format!(
            "path contains directory traversal: {}",
            path
        )));
    }

    if !path
        .chars()
        .all(|c| c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\')
    {
        return Err(ProcessingError::InvalidToolPath(format!(
            "path contains unsafe characters: {}",
            path
        )));
    }

    Ok(())
}

pub(crate) enum ToolFailure {
    Spawn(std::io::Error),
    Cancelled,
}

/// Run `command` to completion, killing it if `cancel` fires first.
pub(crate) async fn run_cancellable(
    command: &mut Command,
    cancel: &CancellationToken,
) -> Result<Output, ToolFailure> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(ToolFailure::Spawn)?;

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ToolFailure::Cancelled),
        output = child.wait_with_output() => output.map_err(ToolFailure::Spawn),
    }
}

/// Last non-empty stderr line, for logs.
pub(crate) fn stderr_summary(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim()
        .to_string()
}
