//! Video ingestion pipeline: gate → stage → probe → remux → key → upload → record update.
//!
//! Stages run strictly in order and every failure aborts the request. The staging
//! area is owned by [`IngestionPipeline::ingest`], so the transient files are removed
//! on every exit path, including cancellation. Playback URLs are signed on read and
//! never persisted; the record only ever carries the encoded storage locator.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vidkeep_core::{AppError, Config, StorageLocator, VideoRecord, VideoResponse};
use vidkeep_db::VideoRepository;
use vidkeep_storage::{derive_video_key, extension_for_content_type, Storage, StorageError};

use crate::error::ProcessingError;
use crate::retry::{retry_async, RetryConfig, RetryError};
use crate::staging::Stager;
use crate::video::{confirm_remux_output, MediaInspector, MediaRemuxer};

/// Limits and policies applied to every ingestion.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_video_size_bytes: u64,
    pub allowed_content_type: String,
    pub url_expiry: Duration,
    pub staging_dir: Option<PathBuf>,
    pub retry: RetryConfig,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_video_size_bytes: config.max_video_size_bytes(),
            allowed_content_type: config.video_allowed_content_type().to_string(),
            url_expiry: config.presigned_url_expiry(),
            staging_dir: config.staging_dir().map(Path::to_path_buf),
            retry: RetryConfig::from_config(config),
        }
    }
}

/// Strip parameters (`; codecs=...`) and case from a MIME type.
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

pub struct IngestionPipeline {
    repository: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    inspector: Arc<dyn MediaInspector>,
    remuxer: Arc<dyn MediaRemuxer>,
    stager: Stager,
    settings: PipelineSettings,
}

impl IngestionPipeline {
    pub fn new(
        repository: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        inspector: Arc<dyn MediaInspector>,
        remuxer: Arc<dyn MediaRemuxer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            repository,
            storage,
            inspector,
            remuxer,
            stager: Stager::new(settings.staging_dir.clone()),
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Load the record and check that `user_id` owns it.
    pub async fn authorize(&self, video_id: Uuid, user_id: Uuid) -> Result<VideoRecord, AppError> {
        let record = self
            .repository
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        if !record.is_owned_by(user_id) {
            tracing::debug!(
                video_id = %video_id,
                user_id = %user_id,
                "Rejected request from non-owner"
            );
            return Err(AppError::Forbidden(
                "You do not own this video".to_string(),
            ));
        }

        Ok(record)
    }

    /// Check a declared content type; returns the file extension to store under.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> Result<String, AppError> {
        let allowed = &self.settings.allowed_content_type;
        let content_type = content_type
            .filter(|ct| !ct.trim().is_empty())
            .ok_or_else(|| {
                AppError::UnsupportedMediaType(format!(
                    "Missing content type. Only {} is accepted",
                    allowed
                ))
            })?;

        let normalized = normalize_mime_type(content_type);
        if normalized != *allowed {
            return Err(AppError::UnsupportedMediaType(format!(
                "Invalid content type {}. Only {} is accepted",
                normalized, allowed
            )));
        }

        extension_for_content_type(allowed).ok_or_else(|| {
            AppError::Internal(format!("No file extension for content type {}", allowed))
        })
    }

    /// Reject a declared body length that already exceeds the limit.
    pub fn check_declared_size(&self, declared: Option<u64>) -> Result<(), AppError> {
        match declared {
            Some(len) if len > self.settings.max_video_size_bytes => {
                Err(ProcessingError::TooLarge {
                    limit: self.settings.max_video_size_bytes,
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    /// Run every stage after the gate for an authorized record.
    #[tracing::instrument(skip_all, fields(video_id = %record.id))]
    pub async fn ingest<R>(
        &self,
        mut record: VideoRecord,
        content_type: &str,
        reader: &mut R,
        cancel: &CancellationToken,
    ) -> Result<VideoResponse, AppError>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let start = Instant::now();
        let extension = self.validate_content_type(Some(content_type))?;
        let content_type = self.settings.allowed_content_type.as_str();

        let staging = self
            .stager
            .stage(reader, &extension, self.settings.max_video_size_bytes)
            .await?;
        tracing::info!(size_bytes = staging.size(), "Upload staged");

        let info = self
            .inspector
            .probe(staging.upload_path(), cancel)
            .await?;
        let orientation = info.orientation();
        tracing::info!(orientation = %orientation, "Video inspected");

        self.remuxer
            .remux(staging.upload_path(), staging.processing_path(), cancel)
            .await?;
        // Any remuxer, not just ffmpeg, must leave a non-empty file behind
        let remuxed_size = confirm_remux_output(staging.processing_path()).await?;
        tracing::info!(size_bytes = remuxed_size, "Video remuxed");

        let key = derive_video_key(orientation, &extension);
        let locator = StorageLocator::new(self.storage.default_bucket(), key)
            .map_err(|e| AppError::Internal(format!("Invalid storage locator: {}", e)))?;

        let processed = staging.processing_path();
        let uploaded = retry_async(
            || self.storage.upload_file(&locator, processed, content_type),
            StorageError::is_transient,
            &self.settings.retry,
            "video_upload",
            cancel,
        )
        .await;

        match uploaded {
            Ok(size) => tracing::info!(
                bucket = %locator.bucket(),
                key = %locator.key(),
                size_bytes = size,
                "Video uploaded"
            ),
            Err(RetryError::Failed(e)) => return Err(e.into()),
            Err(RetryError::Cancelled) => return Err(ProcessingError::Cancelled.into()),
        }

        record.set_video_locator(&locator);
        if let Err(e) = self.repository.update_video(&record).await {
            tracing::error!(
                error = %e,
                key = %locator.key(),
                "Failed to record upload, removing object"
            );
            if let Err(delete_err) = self.storage.delete(&locator).await {
                tracing::warn!(
                    error = %delete_err,
                    bucket = %locator.bucket(),
                    key = %locator.key(),
                    "Failed to remove orphaned object"
                );
            }
            return Err(AppError::Persistence(e.to_string()));
        }

        if let Err(e) = staging.close() {
            tracing::warn!(error = %e, "Failed to remove staging directory");
        }

        tracing::info!(
            key = %locator.key(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video ingestion completed"
        );

        self.signed_view(record).await
    }

    /// The record as clients see it, with a freshly signed playback URL.
    pub async fn signed_view(&self, record: VideoRecord) -> Result<VideoResponse, AppError> {
        let signed = match record.video_locator() {
            None => None,
            Some(Ok(locator)) => Some(
                self.storage
                    .presigned_get_url(&locator, self.settings.url_expiry)
                    .await
                    .map_err(|e| AppError::Signing(e.to_string()))?,
            ),
            Some(Err(e)) => {
                return Err(AppError::Signing(format!(
                    "Stored video locator is malformed: {}",
                    e
                )))
            }
        };

        Ok(VideoResponse::new(record, signed))
    }

    /// Authorize and return the owner's view of a video.
    pub async fn get_for_owner(
        &self,
        video_id: Uuid,
        user_id: Uuid,
    ) -> Result<VideoResponse, AppError> {
        let record = self.authorize(video_id, user_id).await?;
        self.signed_view(record).await
    }
}
