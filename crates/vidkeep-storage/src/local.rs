use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use vidkeep_core::StorageLocator;

/// Characters left as-is in URL path segments (RFC 3986 unreserved).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const PARTIAL_SUFFIX: &str = ".partial";

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage implementation
///
/// Objects live at `<base_path>/<bucket>/<key>`. Playback URLs point at the API's
/// media route and carry an expiry plus an HMAC-SHA256 signature over
/// `bucket/key:expires`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    bucket: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/vidkeep/media")
    /// * `base_url` - Base URL of the media route (e.g., "http://localhost:8091/media")
    /// * `bucket` - Bucket new uploads are written to
    /// * `signing_secret` - Key for playback URL signatures
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        bucket: String,
        signing_secret: &[u8],
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        if signing_secret.is_empty() {
            return Err(StorageError::ConfigError(
                "URL signing secret must not be empty".to_string(),
            ));
        }

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            signing_secret: signing_secret.to_vec(),
        })
    }

    /// Convert a locator to a filesystem path with traversal checks
    ///
    /// Bucket and key may only contain normal path components, so the result
    /// always stays under the base directory.
    fn locator_to_path(&self, locator: &StorageLocator) -> StorageResult<PathBuf> {
        if locator.bucket().contains(['/', '\\']) {
            return Err(StorageError::InvalidKey(
                "Bucket name contains a path separator".to_string(),
            ));
        }

        let key = Path::new(locator.key());
        let all_normal = Path::new(locator.bucket())
            .components()
            .chain(key.components())
            .all(|c| matches!(c, Component::Normal(_)));
        if !all_normal || locator.key().contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(locator.bucket()).join(key))
    }

    fn partial_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(PARTIAL_SUFFIX);
        PathBuf::from(name)
    }

    fn mac(&self, locator: &StorageLocator, expires: u64) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.signing_secret)
            .expect("HMAC accepts any key size");
        mac.update(locator.bucket().as_bytes());
        mac.update(b"/");
        mac.update(locator.key().as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    /// Hex signature for `locator` valid until `expires` (unix seconds).
    pub fn sign(&self, locator: &StorageLocator, expires: u64) -> String {
        hex::encode(self.mac(locator, expires).finalize().into_bytes())
    }

    fn encoded_path(locator: &StorageLocator) -> String {
        let key = locator
            .key()
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{}",
            utf8_percent_encode(locator.bucket(), PATH_SEGMENT),
            key
        )
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// A `.partial` file that is deleted on drop unless it was published.
struct PartialFile {
    path: PathBuf,
    published: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            published: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The file was renamed into place; nothing to clean up.
    fn published(mut self) {
        self.published = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                error = %e,
                path = %self.path.display(),
                "Failed to remove partial upload"
            ),
        }
    }
}

/// Permission and path problems will fail the same way on retry.
fn write_error(action: &str, path: &Path, err: std::io::Error) -> StorageError {
    let message = format!("Failed to {} file {}: {}", action, path.display(), err);
    match err.kind() {
        std::io::ErrorKind::PermissionDenied
        | std::io::ErrorKind::NotFound
        | std::io::ErrorKind::InvalidInput
        | std::io::ErrorKind::AlreadyExists => StorageError::UploadRejected(message),
        _ => StorageError::UploadFailed(message),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[async_trait]
impl Storage for LocalStorage {
    fn default_bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_file(
        &self,
        locator: &StorageLocator,
        source: &Path,
        _content_type: &str,
    ) -> StorageResult<u64> {
        let path = self.locator_to_path(locator)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        // Removed on every exit that does not publish, including a dropped future
        let partial = PartialFile::new(Self::partial_path(&path));

        let result: StorageResult<u64> = async {
            let mut reader = fs::File::open(source).await?;
            let mut file = fs::File::create(partial.path())
                .await
                .map_err(|e| write_error("create", partial.path(), e))?;

            let bytes_copied = tokio::io::copy(&mut reader, &mut file)
                .await
                .map_err(|e| write_error("write", partial.path(), e))?;

            file.flush().await?;
            file.sync_all()
                .await
                .map_err(|e| write_error("sync", partial.path(), e))?;

            // Readers only ever see complete objects
            fs::rename(partial.path(), &path)
                .await
                .map_err(|e| write_error("publish", &path, e))?;

            Ok::<u64, StorageError>(bytes_copied)
        }
        .await;

        match result {
            Ok(size) => {
                partial.published();
                tracing::info!(
                    path = %path.display(),
                    bucket = %locator.bucket(),
                    key = %locator.key(),
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage upload successful"
                );
                Ok(size)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %locator.bucket(),
                    key = %locator.key(),
                    "Local storage upload failed"
                );
                Err(e)
            }
        }
    }

    async fn presigned_get_url(
        &self,
        locator: &StorageLocator,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.locator_to_path(locator)?;

        let expires = unix_now()
            .checked_add(expires_in.as_secs())
            .ok_or_else(|| StorageError::SigningFailed("expiry overflows".to_string()))?;
        let signature = self.sign(locator, expires);

        Ok(format!(
            "{}/{}?expires={}&signature={}",
            self.base_url,
            Self::encoded_path(locator),
            expires,
            signature
        ))
    }

    async fn delete(&self, locator: &StorageLocator) -> StorageResult<()> {
        let path = self.locator_to_path(locator)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    key = %locator.key(),
                    "Local storage delete successful"
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, locator: &StorageLocator) -> StorageResult<bool> {
        let path = self.locator_to_path(locator)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn download_stream(&self, locator: &StorageLocator) -> StorageResult<ByteStream> {
        let path = self.locator_to_path(locator)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(locator.to_string()))
            }
            Err(e) => {
                return Err(StorageError::DownloadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let stream = tokio_util::io::ReaderStream::new(file).map(|result| {
            result.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    fn verify_signed_get(
        &self,
        locator: &StorageLocator,
        expires: u64,
        signature: &str,
    ) -> StorageResult<()> {
        let tag = hex::decode(signature)
            .map_err(|_| StorageError::InvalidSignature("Malformed signature".to_string()))?;

        self.mac(locator, expires)
            .verify_slice(&tag)
            .map_err(|_| StorageError::InvalidSignature("Signature mismatch".to_string()))?;

        if unix_now() > expires {
            return Err(StorageError::InvalidSignature(
                "Signed URL has expired".to_string(),
            ));
        }

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
