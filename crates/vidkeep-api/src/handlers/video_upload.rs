use std::io;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header::CONTENT_LENGTH, HeaderMap},
    Json,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use vidkeep_core::constants::VIDEO_FIELD_NAME;
use vidkeep_core::{AppError, VideoResponse};

use super::VideoId;
use crate::auth::AuthUser;
use crate::error::{multipart_error, ErrorResponse, HttpAppError};
use crate::state::AppState;

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[utoipa::path(
    post,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video uploaded successfully", body = VideoResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Content type is not video/mp4", body = ErrorResponse),
        (status = 422, description = "File is not a usable video", body = ErrorResponse),
        (status = 502, description = "Object store rejected the upload", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, headers, multipart),
    fields(
        video_id = %video_id.0,
        user_id = %user.user_id,
        operation = "upload_video"
    )
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    video_id: VideoId,
    user: AuthUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let record = state.pipeline.authorize(video_id.0, user.user_id).await?;
    state.pipeline.check_declared_size(declared_length(&headers))?;

    // Cancelled when this future is dropped, e.g. on client disconnect
    let cancel = CancellationToken::new();
    let _cancel_guard = cancel.clone().drop_guard();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(VIDEO_FIELD_NAME) {
            if field.file_name().is_some() {
                return Err(AppError::InvalidInput(format!(
                    "Unexpected file field; upload the video as '{}'",
                    VIDEO_FIELD_NAME
                ))
                .into());
            }
            // Plain form fields carry nothing we use
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        state.pipeline.validate_content_type(content_type.as_deref())?;
        let content_type = content_type.unwrap_or_default();

        let body = field.map_err(io::Error::other);
        let mut reader = StreamReader::new(Box::pin(body));

        let response = state
            .pipeline
            .ingest(record, &content_type, &mut reader, &cancel)
            .await?;

        return Ok(Json(response));
    }

    Err(AppError::InvalidInput(format!("Missing '{}' form field", VIDEO_FIELD_NAME)).into())
}
