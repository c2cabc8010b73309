//! Constants shared across crates.

/// Multipart field carrying the uploaded video.
pub const VIDEO_FIELD_NAME: &str = "video";

/// Number of random bytes in a derived storage key (256 bits).
pub const STORAGE_KEY_RANDOM_BYTES: usize = 32;
