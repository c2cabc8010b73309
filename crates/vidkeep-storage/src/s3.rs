use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStoreExt, Result as ObjectResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use vidkeep_core::StorageLocator;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<AmazonS3>,
    builder: AmazonS3Builder,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name new uploads are written to
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment; region and endpoint are explicit.
        let mut builder = AmazonS3Builder::from_env().with_region(region);

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        Self::from_builder(builder, bucket)
    }

    /// Build from a prepared builder. The bucket name is applied per store.
    pub fn from_builder(builder: AmazonS3Builder, bucket: String) -> StorageResult<Self> {
        let store = builder
            .clone()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            builder,
            bucket,
        })
    }

    /// Store bound to the locator's bucket; the default bucket reuses the shared client.
    fn store_for(&self, locator: &StorageLocator) -> StorageResult<Arc<AmazonS3>> {
        if locator.bucket() == self.bucket {
            return Ok(self.store.clone());
        }

        let store = self
            .builder
            .clone()
            .with_bucket_name(locator.bucket())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        Ok(Arc::new(store))
    }

    fn object_path(locator: &StorageLocator) -> StorageResult<Path> {
        Path::parse(locator.key()).map_err(|e| StorageError::InvalidKey(e.to_string()))
    }
}

/// A multipart write that is aborted unless it completes.
///
/// Dropping it mid-flight (request cancelled) schedules the abort on the
/// current runtime so no incomplete multipart upload is left in the bucket.
struct PendingUpload {
    writer: Option<BufWriter>,
    locator: StorageLocator,
}

impl PendingUpload {
    fn new(writer: BufWriter, locator: &StorageLocator) -> Self {
        Self {
            writer: Some(writer),
            locator: locator.clone(),
        }
    }

    async fn write_from(&mut self, file: &mut tokio::fs::File) -> std::io::Result<u64> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("upload already finished"))?;
        let size = tokio::io::copy(file, writer).await?;
        writer.shutdown().await?;
        Ok(size)
    }

    fn completed(mut self) {
        self.writer = None;
    }

    async fn abort(mut self) {
        if let Some(mut writer) = self.writer.take() {
            abort_writer(&mut writer, &self.locator).await;
        }
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        let Some(mut writer) = self.writer.take() else {
            return;
        };
        let locator = self.locator.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    abort_writer(&mut writer, &locator).await;
                });
            }
            Err(_) => tracing::warn!(
                bucket = %locator.bucket(),
                key = %locator.key(),
                "No runtime to abort dropped S3 upload"
            ),
        }
    }
}

async fn abort_writer(writer: &mut BufWriter, locator: &StorageLocator) {
    if let Err(e) = writer.abort().await {
        tracing::warn!(
            error = %e,
            bucket = %locator.bucket(),
            key = %locator.key(),
            "Failed to abort S3 upload"
        );
    }
}

fn classify_upload_error(err: ObjectStoreError) -> StorageError {
    match err {
        ObjectStoreError::PermissionDenied { .. }
        | ObjectStoreError::Unauthenticated { .. } => StorageError::UploadRejected(err.to_string()),
        other => StorageError::UploadFailed(other.to_string()),
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn default_bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_file(
        &self,
        locator: &StorageLocator,
        source: &std::path::Path,
        content_type: &str,
    ) -> StorageResult<u64> {
        let store: Arc<dyn object_store::ObjectStore> = self.store_for(locator)?;
        let location = Self::object_path(locator)?;
        let start = std::time::Instant::now();

        let mut file = tokio::fs::File::open(source).await?;

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let writer = BufWriter::new(store, location).with_attributes(attributes);
        let mut pending = PendingUpload::new(writer, locator);

        match pending.write_from(&mut file).await {
            Ok(size) => {
                pending.completed();
                tracing::info!(
                    bucket = %locator.bucket(),
                    key = %locator.key(),
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload successful"
                );
                Ok(size)
            }
            Err(e) => {
                pending.abort().await;
                tracing::error!(
                    error = %e,
                    bucket = %locator.bucket(),
                    key = %locator.key(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                // BufWriter surfaces object_store failures as io::Error carrying the original
                match e.into_inner() {
                    Some(inner) => match inner.downcast::<ObjectStoreError>() {
                        Ok(store_err) => Err(classify_upload_error(*store_err)),
                        Err(other) => Err(StorageError::UploadFailed(other.to_string())),
                    },
                    None => Err(StorageError::UploadFailed("upload interrupted".to_string())),
                }
            }
        }
    }

    async fn presigned_get_url(
        &self,
        locator: &StorageLocator,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let store = self.store_for(locator)?;
        let location = Self::object_path(locator)?;
        let url_result: ObjectResult<_> = store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?
            .to_string();

        Ok(url)
    }

    async fn delete(&self, locator: &StorageLocator) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let store = self.store_for(locator)?;
        let location = Self::object_path(locator)?;

        let result: ObjectResult<_> = store.delete(&location).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %locator.bucket(),
                    key = %locator.key(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %locator.bucket(),
            key = %locator.key(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, locator: &StorageLocator) -> StorageResult<bool> {
        let store = self.store_for(locator)?;
        let location = Self::object_path(locator)?;
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn download_stream(&self, locator: &StorageLocator) -> StorageResult<ByteStream> {
        let store = self.store_for(locator)?;
        let location = Self::object_path(locator)?;

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(locator.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let stream = result
            .into_stream()
            .map(|res| res.map_err(|e| StorageError::DownloadFailed(e.to_string())));

        Ok(Box::pin(stream))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
