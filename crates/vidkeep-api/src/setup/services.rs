//! Wiring of the record store, object store and media tools into the pipeline.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use vidkeep_core::Config;
use vidkeep_db::create_video_repository;
use vidkeep_processing::{FfmpegRemuxer, FfprobeInspector, IngestionPipeline, PipelineSettings};
use vidkeep_storage::create_storage;

use crate::state::AppState;

pub async fn initialize_services(config: Config, pool: Option<PgPool>) -> Result<AppState> {
    let repository = create_video_repository(pool);

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage")?;

    let inspector = FfprobeInspector::new(config.ffprobe_path().to_string())
        .context("Invalid FFPROBE_PATH")?;
    let remuxer =
        FfmpegRemuxer::new(config.ffmpeg_path().to_string()).context("Invalid FFMPEG_PATH")?;

    let settings = PipelineSettings::from_config(&config);
    tracing::info!(
        bucket = %storage.default_bucket(),
        max_video_mb = settings.max_video_size_bytes / 1024 / 1024,
        url_expiry_secs = settings.url_expiry.as_secs(),
        upload_max_attempts = settings.retry.max_attempts,
        "Ingestion pipeline configured"
    );

    let pipeline = IngestionPipeline::new(
        repository,
        storage.clone(),
        Arc::new(inspector),
        Arc::new(remuxer),
        settings,
    );

    Ok(AppState::new(config, pipeline, storage))
}
