//! Video processing module

mod command;
pub mod orientation;
pub mod probe;
pub mod remux;

pub use orientation::classify_orientation;
pub use probe::{parse_probe_output, FfprobeInspector, MediaInfo, MediaInspector, StreamDimensions};
pub use remux::{confirm_remux_output, FfmpegRemuxer, MediaRemuxer};
