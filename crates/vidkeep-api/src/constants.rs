//! Route prefixes and request limits.

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Path under which the local backend's signed URLs are served
pub const MEDIA_PREFIX: &str = "/media";

/// Room for multipart boundaries and part headers on top of the video size limit
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;
