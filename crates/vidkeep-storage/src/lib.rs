//! vidkeep storage library
//!
//! Durable object storage for ingested videos: the [`Storage`] trait, an S3 backend
//! built on `object_store`, and a local filesystem backend that issues HMAC-signed
//! playback URLs.
//!
//! # Key format
//!
//! Video keys are `<orientation>/<random>.<ext>`, where `<random>` is 256 bits from
//! a CSPRNG encoded as unpadded base64url. Keys are never derived from user input.
//! Key generation lives in the `keys` module so every backend sees the same layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{derive_video_key, extension_for_content_type};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
pub use vidkeep_core::{StorageBackend, StorageLocator};
