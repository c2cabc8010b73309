//! Serves objects of the local backend behind signed URLs.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use vidkeep_core::{AppError, StorageLocator};

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: u64,
    pub signature: String,
}

#[tracing::instrument(skip(state, query), fields(operation = "serve_media"))]
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    query: Result<Query<SignedQuery>, QueryRejection>,
) -> Result<Response, HttpAppError> {
    let Query(query) = query
        .map_err(|_| AppError::Unauthorized("Missing or malformed URL signature".to_string()))?;

    let locator = StorageLocator::new(bucket, key)
        .map_err(|e| AppError::InvalidInput(format!("Invalid media path: {}", e)))?;

    state
        .storage
        .verify_signed_get(&locator, query.expires, &query.signature)?;

    let stream = state.storage.download_stream(&locator).await?;

    let content_type = HeaderValue::from_str(state.config.video_allowed_content_type())
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, max-age=300")),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
