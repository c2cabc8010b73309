//! Stand-ins for ffprobe and ffmpeg.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vidkeep_processing::{MediaInfo, MediaInspector, MediaRemuxer, ProcessingError, StreamDimensions};

pub struct FakeInspector {
    pub dimensions: Option<(u32, u32)>,
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn probe(
        &self,
        _path: &Path,
        _cancel: &CancellationToken,
    ) -> Result<MediaInfo, ProcessingError> {
        Ok(MediaInfo {
            codec_name: Some("h264".to_string()),
            dimensions: self
                .dimensions
                .map(|(width, height)| StreamDimensions { width, height }),
        })
    }
}

pub struct FakeRemuxer {
    pub fail: bool,
    pub calls: AtomicU32,
}

impl FakeRemuxer {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaRemuxer for FakeRemuxer {
    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        _cancel: &CancellationToken,
    ) -> Result<(), ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProcessingError::Remux(
                "Could not prepare video for streaming".to_string(),
            ));
        }
        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}
