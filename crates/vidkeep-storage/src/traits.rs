//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use vidkeep_core::{AppError, StorageLocator};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The store refused the write; retrying will not help
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether a retry of the same operation could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StorageError::UploadFailed(_) | StorageError::BackendError(_)
        )
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Object not found: {}", key)),
            StorageError::SigningFailed(msg) => AppError::Signing(msg),
            StorageError::InvalidSignature(msg) => AppError::Unauthorized(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::Upload(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked object body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// Objects are addressed by [`StorageLocator`] (bucket + key). Backends accept any
/// bucket named in a locator; `default_bucket` is where new uploads land.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Bucket new uploads are written to
    fn default_bucket(&self) -> &str;

    /// Stream a local file into the object store with its content type attached.
    ///
    /// Partially written objects are aborted on failure and never become visible.
    /// Returns the number of bytes written.
    async fn upload_file(
        &self,
        locator: &StorageLocator,
        source: &Path,
        content_type: &str,
    ) -> StorageResult<u64>;

    /// Generate a presigned/temporary URL for direct access (GET)
    async fn presigned_get_url(
        &self,
        locator: &StorageLocator,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, locator: &StorageLocator) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, locator: &StorageLocator) -> StorageResult<bool>;

    /// Download an object as a stream of chunks
    async fn download_stream(&self, locator: &StorageLocator) -> StorageResult<ByteStream>;

    /// Check a signed GET issued by [`Storage::presigned_get_url`].
    ///
    /// Only backends that serve their own URLs can verify them; the rest refuse.
    fn verify_signed_get(
        &self,
        _locator: &StorageLocator,
        _expires: u64,
        _signature: &str,
    ) -> StorageResult<()> {
        Err(StorageError::ConfigError(format!(
            "{} backend does not serve signed URLs",
            self.backend_type()
        )))
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
