use std::sync::Arc;

use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vidkeep_core::{AppError, VideoRecord};

use super::memory::InMemoryVideoRepository;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("video {0} not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => AppError::NotFound(format!("Video {} not found", id)),
            RepositoryError::Database(e) => AppError::Persistence(e.to_string()),
        }
    }
}

/// Record store capability consumed by the ingestion pipeline.
#[async_trait::async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, RepositoryError>;

    /// Write back every mutable column. Fails with `NotFound` if the row is gone.
    async fn update_video(&self, video: &VideoRecord) -> Result<(), RepositoryError>;

    async fn create_video(&self, video: &VideoRecord) -> Result<(), RepositoryError>;
}

#[derive(Clone)]
pub struct PostgresVideoRepository {
    pool: PgPool,
}

impl PostgresVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VideoRepository for PostgresVideoRepository {
    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "videos",
        db.operation = "select"
    ))]
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, RepositoryError> {
        let row = sqlx::query_as::<Postgres, VideoRecord>(
            r#"
            SELECT id, user_id, title, description, thumbnail_url, video_url,
                   created_at, updated_at
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, video_id = %id, "Failed to load video");
            e
        })?;

        Ok(row)
    }

    #[tracing::instrument(skip(self, video), fields(
        db.system = "postgresql",
        db.table = "videos",
        db.operation = "update",
        video_id = %video.id
    ))]
    async fn update_video(&self, video: &VideoRecord) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = $2,
                description = $3,
                thumbnail_url = $4,
                video_url = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, video_id = %video.id, "Failed to update video");
            e
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(video.id));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, video), fields(
        db.system = "postgresql",
        db.table = "videos",
        db.operation = "insert",
        video_id = %video.id
    ))]
    async fn create_video(&self, video: &VideoRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO videos (
                id, user_id, title, description, thumbnail_url, video_url,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(video.id)
        .bind(video.user_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Create the video repository: Postgres when a pool is available, otherwise in-memory.
pub fn create_video_repository(pool: Option<PgPool>) -> Arc<dyn VideoRepository> {
    match pool {
        Some(pool) => Arc::new(PostgresVideoRepository::new(pool)),
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory video repository");
            Arc::new(InMemoryVideoRepository::new())
        }
    }
}
