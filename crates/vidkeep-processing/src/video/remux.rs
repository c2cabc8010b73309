//! Lossless container remux that moves the MP4 index to the front of the file.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::command::{run_cancellable, stderr_summary, validate_tool_path, ToolFailure};
use crate::error::ProcessingError;

const REMUX_FAILED: &str = "Could not prepare video for streaming";

/// Container remux capability.
#[async_trait]
pub trait MediaRemuxer: Send + Sync {
    /// Write a streaming-friendly copy of `input` to `output` without re-encoding.
    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ProcessingError>;
}

/// Size of a remux output, or a `RemuxError` if it is missing or empty.
pub async fn confirm_remux_output(output: &Path) -> Result<u64, ProcessingError> {
    let size = match tokio::fs::metadata(output).await {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::warn!(error = %e, "Remux finished but produced no output");
            return Err(ProcessingError::Remux(REMUX_FAILED.to_string()));
        }
    };
    if size == 0 {
        tracing::warn!("Remux produced an empty output file");
        return Err(ProcessingError::Remux(REMUX_FAILED.to_string()));
    }
    Ok(size)
}

pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: String) -> Result<Self, ProcessingError> {
        validate_tool_path(&ffmpeg_path)?;
        Ok(Self { ffmpeg_path })
    }
}

#[async_trait]
impl MediaRemuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self, cancel), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "remux"
    ))]
    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ProcessingError> {
        let start = std::time::Instant::now();

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output);

        let result = match run_cancellable(&mut command, cancel).await {
            Ok(result) => result,
            Err(ToolFailure::Cancelled) => return Err(ProcessingError::Cancelled),
            Err(ToolFailure::Spawn(e)) => {
                tracing::error!(error = %e, "Failed to execute ffmpeg");
                return Err(ProcessingError::Remux(REMUX_FAILED.to_string()));
            }
        };

        if !result.status.success() {
            tracing::warn!(
                status = %result.status,
                stderr = %stderr_summary(&result),
                "ffmpeg remux failed"
            );
            return Err(ProcessingError::Remux(REMUX_FAILED.to_string()));
        }

        let size = confirm_remux_output(output).await?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            size_bytes = size,
            "Video remux completed"
        );

        Ok(())
    }
}
