//! vidkeep processing library
//!
//! The ingestion pipeline and the local stages it drives: staging the upload to
//! disk, inspecting it with ffprobe, remuxing it with ffmpeg, and retrying the
//! durable upload.

pub mod error;
pub mod pipeline;
pub mod retry;
pub mod staging;
pub mod video;

#[cfg(test)]
mod test_helpers;

pub use error::ProcessingError;
pub use pipeline::{IngestionPipeline, PipelineSettings};
pub use retry::{retry_async, RetryConfig, RetryError};
pub use staging::{Stager, StagingArea};
pub use video::{
    classify_orientation, parse_probe_output, FfmpegRemuxer, FfprobeInspector, MediaInfo,
    MediaInspector, MediaRemuxer, StreamDimensions,
};
