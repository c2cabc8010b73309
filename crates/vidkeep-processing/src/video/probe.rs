//! Media inspection: stream dimensions via ffprobe.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use vidkeep_core::Orientation;

use super::command::{run_cancellable, stderr_summary, validate_tool_path, ToolFailure};
use super::orientation::classify_orientation;
use crate::error::ProcessingError;

const PROBE_FAILED: &str = "Could not read video metadata";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDimensions {
    pub width: u32,
    pub height: u32,
}

/// What the pipeline needs to know about an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub codec_name: Option<String>,
    /// `None` when the selected stream reports no width/height.
    pub dimensions: Option<StreamDimensions>,
}

impl MediaInfo {
    pub fn orientation(&self) -> Orientation {
        match self.dimensions {
            Some(d) => classify_orientation(d.width, d.height),
            None => Orientation::Other,
        }
    }
}

/// Media analysis capability.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn probe(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<MediaInfo, ProcessingError>;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse `ffprobe -print_format json -show_streams` output.
///
/// Picks the first video stream, falling back to the first stream that carries
/// dimensions, then to the first stream at all.
pub fn parse_probe_output(stdout: &[u8]) -> Result<MediaInfo, ProcessingError> {
    let output: FfprobeOutput = serde_json::from_slice(stdout).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse ffprobe output");
        ProcessingError::Probe(PROBE_FAILED.to_string())
    })?;

    let stream = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .or_else(|| {
            output
                .streams
                .iter()
                .find(|s| s.width.is_some() && s.height.is_some())
        })
        .or_else(|| output.streams.first())
        .ok_or_else(|| ProcessingError::Probe("No streams found in video".to_string()))?;

    let dimensions = match (stream.width, stream.height) {
        (Some(width), Some(height)) => Some(StreamDimensions { width, height }),
        _ => {
            tracing::warn!(
                codec_type = ?stream.codec_type,
                codec_name = ?stream.codec_name,
                "Selected stream has no dimensions"
            );
            None
        }
    };

    Ok(MediaInfo {
        codec_name: stream.codec_name.clone(),
        dimensions,
    })
}

pub struct FfprobeInspector {
    ffprobe_path: String,
}

impl FfprobeInspector {
    pub fn new(ffprobe_path: String) -> Result<Self, ProcessingError> {
        validate_tool_path(&ffprobe_path)?;
        Ok(Self { ffprobe_path })
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    #[tracing::instrument(skip(self, cancel), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<MediaInfo, ProcessingError> {
        let start = std::time::Instant::now();

        let mut command = Command::new(&self.ffprobe_path);
        command
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path);

        let output = match run_cancellable(&mut command, cancel).await {
            Ok(output) => output,
            Err(ToolFailure::Cancelled) => return Err(ProcessingError::Cancelled),
            Err(ToolFailure::Spawn(e)) => {
                tracing::error!(error = %e, "Failed to execute ffprobe");
                return Err(ProcessingError::Probe(PROBE_FAILED.to_string()));
            }
        };

        if !output.status.success() {
            tracing::warn!(
                status = %output.status,
                stderr = %stderr_summary(&output),
                "ffprobe failed"
            );
            return Err(ProcessingError::Probe(PROBE_FAILED.to_string()));
        }

        let info = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = info.dimensions.map(|d| d.width),
            height = info.dimensions.map(|d| d.height),
            codec = ?info.codec_name,
            "Video probe completed"
        );

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selects_video_stream() {
        let json = br#"{
            "streams": [
                {"index": 0, "codec_type": "audio", "codec_name": "aac"},
                {"index": 1, "codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080}
            ]
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert_eq!(
            info.dimensions,
            Some(StreamDimensions {
                width: 1920,
                height: 1080
            })
        );
        assert_eq!(info.codec_name.as_deref(), Some("h264"));
        assert_eq!(info.orientation(), Orientation::Landscape);
    }

    #[test]
    fn test_parse_falls_back_to_stream_with_dimensions() {
        let json = br#"{
            "streams": [
                {"codec_type": "data"},
                {"codec_name": "mjpeg", "width": 1080, "height": 1920}
            ]
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.orientation(), Orientation::Portrait);
    }

    #[test]
    fn test_parse_stream_without_dimensions_is_other() {
        let json = br#"{"streams": [{"codec_type": "audio", "codec_name": "aac"}]}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.dimensions, None);
        assert_eq!(info.orientation(), Orientation::Other);
    }

    #[test]
    fn test_parse_empty_streams_is_probe_error() {
        assert!(matches!(
            parse_probe_output(br#"{"streams": []}"#),
            Err(ProcessingError::Probe(_))
        ));
        assert!(matches!(
            parse_probe_output(b"{}"),
            Err(ProcessingError::Probe(_))
        ));
    }

    #[test]
    fn test_parse_garbage_is_probe_error() {
        assert!(matches!(
            parse_probe_output(b"ffprobe: not json"),
            Err(ProcessingError::Probe(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_probe_error() {
        let inspector = FfprobeInspector::new("/nonexistent/vidkeep-ffprobe".to_string()).unwrap();
        let err = inspector
            .probe(Path::new("/tmp/none.mp4"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Probe(_)));
    }

    #[test]
    fn test_rejects_unsafe_binary_path() {
        assert!(FfprobeInspector::new("ffprobe && curl".to_string()).is_err());
    }
}
