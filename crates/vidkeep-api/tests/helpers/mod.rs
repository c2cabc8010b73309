//! Test helpers: build AppState and router for integration tests.
//!
//! The router is the production one; the record store is in memory, objects land in a
//! temporary directory through the local backend, and ffprobe/ffmpeg are faked.

#![allow(dead_code)]

pub mod auth;
pub mod fakes;

use std::path::PathBuf;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use axum_test::TestServer;
use tempfile::TempDir;
use uuid::Uuid;
use vidkeep_api::setup::routes;
use vidkeep_api::AppState;
use vidkeep_core::{BaseConfig, Config, StorageBackend, VideoRecord, VideoServiceConfig};
use vidkeep_db::{InMemoryVideoRepository, VideoRepository};
use vidkeep_processing::{IngestionPipeline, PipelineSettings};
use vidkeep_storage::{LocalStorage, Storage};

use fakes::{FakeInspector, FakeRemuxer};

pub const TEST_BUCKET: &str = "local";
pub const MEDIA_BASE_URL: &str = "http://localhost:8091/media";
pub const TEST_MAX_VIDEO_BYTES: u64 = 64 * 1024;

/// Options for the fake media tools.
pub struct MediaSetup {
    pub dimensions: Option<(u32, u32)>,
    pub remux_fails: bool,
}

impl Default for MediaSetup {
    fn default() -> Self {
        Self {
            dimensions: Some((1920, 1080)),
            remux_fails: false,
        }
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub repo: Arc<InMemoryVideoRepository>,
    pub storage: Arc<LocalStorage>,
    pub remuxer: Arc<FakeRemuxer>,
    pub objects_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Create a video row owned by `owner` with no upload yet.
    pub async fn seed_video(&self, owner: Uuid) -> VideoRecord {
        let record = VideoRecord::new(owner, "Skateboarding at dusk");
        self.repo
            .create_video(&record)
            .await
            .expect("Failed to seed video");
        record
    }

    pub async fn stored(&self, id: Uuid) -> VideoRecord {
        self.repo
            .get_video(id)
            .await
            .expect("Failed to read video")
            .expect("Video row disappeared")
    }

    pub fn staging_entries(&self) -> usize {
        std::fs::read_dir(&self.staging_dir)
            .map(|d| d.count())
            .unwrap_or(0)
    }

    pub fn object_count(&self) -> usize {
        fn count(dir: &std::path::Path) -> usize {
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
        count(&self.objects_dir)
    }
}

pub fn create_test_config(temp_dir: &TempDir) -> Config {
    Config(Box::new(VideoServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            log_format: "compact".to_string(),
            jwt_secret: auth::TEST_JWT_SECRET.to_string(),
            database_url: None,
            db_max_connections: 1,
            db_timeout_seconds: 5,
        },
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(temp_dir.path().join("objects").display().to_string()),
        local_storage_base_url: Some(MEDIA_BASE_URL.to_string()),
        local_storage_bucket: TEST_BUCKET.to_string(),
        url_signing_secret: "integration-test-url-signing-secret".to_string(),
        presigned_url_expiry_secs: 3600,
        max_video_size_bytes: TEST_MAX_VIDEO_BYTES,
        video_allowed_content_type: "video/mp4".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        ffmpeg_path: "ffmpeg".to_string(),
        staging_dir: Some(temp_dir.path().join("staging")),
        upload_max_attempts: 3,
        upload_retry_initial_ms: 1,
        upload_retry_max_ms: 5,
    }))
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(MediaSetup::default()).await
}

/// Setup test app with an in-memory record store and local storage.
pub async fn setup_test_app_with(media: MediaSetup) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = create_test_config(&temp_dir);

    let objects_dir = temp_dir.path().join("objects");
    let staging_dir = temp_dir.path().join("staging");
    std::fs::create_dir_all(&staging_dir).expect("Failed to create staging directory");

    let storage = Arc::new(
        LocalStorage::new(
            objects_dir.clone(),
            MEDIA_BASE_URL.to_string(),
            TEST_BUCKET.to_string(),
            config.url_signing_secret().as_bytes(),
        )
        .await
        .expect("Failed to create local storage"),
    );
    let repo = Arc::new(InMemoryVideoRepository::new());
    let remuxer = Arc::new(FakeRemuxer {
        fail: media.remux_fails,
        calls: AtomicU32::new(0),
    });

    let pipeline = IngestionPipeline::new(
        repo.clone(),
        storage.clone(),
        Arc::new(FakeInspector {
            dimensions: media.dimensions,
        }),
        remuxer.clone(),
        PipelineSettings::from_config(&config),
    );
    let storage_dyn: Arc<dyn Storage> = storage.clone();
    let state = Arc::new(AppState::new(config.clone(), pipeline, storage_dyn));

    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        repo,
        storage,
        remuxer,
        objects_dir,
        staging_dir,
        _temp_dir: temp_dir,
    }
}
