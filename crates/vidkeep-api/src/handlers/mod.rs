pub mod health;
pub mod media_serve;
pub mod video_get;
pub mod video_upload;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use uuid::Uuid;
use vidkeep_core::AppError;

use crate::error::HttpAppError;

/// The `{video_id}` path segment, parsed before anything else about the request.
#[derive(Debug, Clone, Copy)]
pub struct VideoId(pub Uuid);

impl<S> FromRequestParts<S> for VideoId
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::InvalidInput(e.body_text()))?;
        let id = Uuid::parse_str(&raw)?;
        Ok(VideoId(id))
    }
}
