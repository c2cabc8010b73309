//! Fakes for exercising the pipeline without ffmpeg or a real object store.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vidkeep_core::{StorageBackend, StorageLocator, VideoRecord};
use vidkeep_db::{InMemoryVideoRepository, VideoRepository};
use vidkeep_storage::{ByteStream, LocalStorage, Storage, StorageError, StorageResult};

use crate::error::ProcessingError;
use crate::pipeline::{IngestionPipeline, PipelineSettings};
use crate::retry::RetryConfig;
use crate::video::{MediaInfo, MediaInspector, MediaRemuxer, StreamDimensions};

pub const TEST_BUCKET: &str = "videos";
pub const TEST_MAX_BYTES: u64 = 4096;

fn dims(width: u32, height: u32) -> MediaInfo {
    MediaInfo {
        codec_name: Some("h264".to_string()),
        dimensions: Some(StreamDimensions { width, height }),
    }
}

pub fn landscape() -> MediaInfo {
    dims(1920, 1080)
}

pub fn portrait() -> MediaInfo {
    dims(1080, 1920)
}

pub fn square() -> MediaInfo {
    dims(720, 720)
}

pub fn no_dimensions() -> MediaInfo {
    MediaInfo {
        codec_name: Some("aac".to_string()),
        dimensions: None,
    }
}

pub struct FakeInspector {
    info: Option<MediaInfo>,
    calls: AtomicU32,
}

impl FakeInspector {
    pub fn returning(info: MediaInfo) -> Self {
        Self {
            info: Some(info),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            info: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn probe(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<MediaInfo, ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }
        assert!(path.exists(), "probe ran before the upload was staged");
        self.info
            .clone()
            .ok_or_else(|| ProcessingError::Probe("Could not read video metadata".to_string()))
    }
}

enum RemuxBehavior {
    Copy,
    Fail,
    /// Reports success without writing anything
    Silent,
}

/// Copies input to output, fails, or claims success without output.
pub struct FakeRemuxer {
    behavior: RemuxBehavior,
}

impl FakeRemuxer {
    pub fn copying() -> Self {
        Self {
            behavior: RemuxBehavior::Copy,
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: RemuxBehavior::Fail,
        }
    }

    pub fn silent() -> Self {
        Self {
            behavior: RemuxBehavior::Silent,
        }
    }
}

#[async_trait]
impl MediaRemuxer for FakeRemuxer {
    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ProcessingError> {
        if cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }
        match self.behavior {
            RemuxBehavior::Copy => {
                tokio::fs::copy(input, output).await?;
                Ok(())
            }
            RemuxBehavior::Fail => Err(ProcessingError::Remux(
                "Could not prepare video for streaming".to_string(),
            )),
            RemuxBehavior::Silent => Ok(()),
        }
    }
}

/// Local storage that can be told to fail its next uploads.
pub struct FlakyStorage {
    inner: LocalStorage,
    root: PathBuf,
    failures_left: AtomicU32,
    transient: AtomicBool,
    upload_attempts: AtomicU32,
}

impl FlakyStorage {
    pub fn fail_next_uploads(&self, count: u32, transient: bool) {
        self.failures_left.store(count, Ordering::SeqCst);
        self.transient.store(transient, Ordering::SeqCst);
    }

    pub fn upload_attempts(&self) -> u32 {
        self.upload_attempts.load(Ordering::SeqCst)
    }

    pub fn object_count(&self) -> usize {
        fn count(dir: &Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .filter_map(Result::ok)
                        .map(|e| {
                            let path = e.path();
                            if path.is_dir() {
                                count(&path)
                            } else {
                                1
                            }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }
        count(&self.root)
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    fn default_bucket(&self) -> &str {
        self.inner.default_bucket()
    }

    async fn upload_file(
        &self,
        locator: &StorageLocator,
        source: &Path,
        content_type: &str,
    ) -> StorageResult<u64> {
        self.upload_attempts.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(if self.transient.load(Ordering::SeqCst) {
                StorageError::UploadFailed("503 Slow Down".to_string())
            } else {
                StorageError::UploadRejected("403 Access Denied".to_string())
            });
        }
        self.inner.upload_file(locator, source, content_type).await
    }

    async fn presigned_get_url(
        &self,
        locator: &StorageLocator,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.inner.presigned_get_url(locator, expires_in).await
    }

    async fn delete(&self, locator: &StorageLocator) -> StorageResult<()> {
        self.inner.delete(locator).await
    }

    async fn exists(&self, locator: &StorageLocator) -> StorageResult<bool> {
        self.inner.exists(locator).await
    }

    async fn download_stream(&self, locator: &StorageLocator) -> StorageResult<ByteStream> {
        self.inner.download_stream(locator).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub struct TestContext {
    pub pipeline: IngestionPipeline,
    pub repo: Arc<InMemoryVideoRepository>,
    pub storage: Arc<FlakyStorage>,
    pub inspector: Arc<FakeInspector>,
    pub remuxer: Arc<FakeRemuxer>,
    staging_root: PathBuf,
    _dir: TempDir,
}

impl TestContext {
    pub async fn new(info: MediaInfo) -> Self {
        Self::build(FakeInspector::returning(info), FakeRemuxer::copying()).await
    }

    pub async fn with_remuxer(info: MediaInfo, remuxer: FakeRemuxer) -> Self {
        Self::build(FakeInspector::returning(info), remuxer).await
    }

    pub async fn with_inspector(inspector: FakeInspector) -> Self {
        Self::build(inspector, FakeRemuxer::copying()).await
    }

    async fn build(inspector: FakeInspector, remuxer: FakeRemuxer) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let objects = dir.path().join("objects");
        let staging_root = dir.path().join("staging");
        std::fs::create_dir_all(&staging_root).unwrap();

        let inner = LocalStorage::new(
            objects.clone(),
            "http://localhost:8091/media".to_string(),
            TEST_BUCKET.to_string(),
            b"pipeline-test-secret",
        )
        .await
        .unwrap();

        let storage = Arc::new(FlakyStorage {
            inner,
            root: objects,
            failures_left: AtomicU32::new(0),
            transient: AtomicBool::new(true),
            upload_attempts: AtomicU32::new(0),
        });
        let repo = Arc::new(InMemoryVideoRepository::new());
        let inspector = Arc::new(inspector);
        let remuxer = Arc::new(remuxer);

        Self {
            pipeline: IngestionPipeline::new(
                repo.clone(),
                storage.clone(),
                inspector.clone(),
                remuxer.clone(),
                Self::settings(&staging_root, Duration::from_secs(3600)),
            ),
            repo,
            storage,
            inspector,
            remuxer,
            staging_root,
            _dir: dir,
        }
    }

    fn settings(staging_root: &Path, url_expiry: Duration) -> PipelineSettings {
        PipelineSettings {
            max_video_size_bytes: TEST_MAX_BYTES,
            allowed_content_type: "video/mp4".to_string(),
            url_expiry,
            staging_dir: Some(staging_root.to_path_buf()),
            retry: RetryConfig {
                max_attempts: 3,
                initial_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(5),
                multiplier: 2.0,
            },
        }
    }

    /// A second pipeline over the same stores with a different URL lifetime.
    pub fn pipeline_with_expiry(&self, url_expiry: Duration) -> IngestionPipeline {
        IngestionPipeline::new(
            self.repo.clone(),
            self.storage.clone(),
            self.inspector.clone(),
            self.remuxer.clone(),
            Self::settings(&self.staging_root, url_expiry),
        )
    }

    pub async fn seed_video(&self) -> VideoRecord {
        let record = VideoRecord::new(Uuid::new_v4(), "launch demo");
        self.repo.create_video(&record).await.unwrap();
        record
    }

    /// Entries left under the staging root.
    pub fn staging_entries(&self) -> usize {
        std::fs::read_dir(&self.staging_root)
            .map(|d| d.count())
            .unwrap_or(0)
    }
}
