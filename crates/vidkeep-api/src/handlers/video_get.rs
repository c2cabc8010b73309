use std::sync::Arc;

use axum::{extract::State, Json};
use vidkeep_core::VideoResponse;

use super::VideoId;
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video found", body = VideoResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state),
    fields(
        video_id = %video_id.0,
        user_id = %user.user_id,
        operation = "get_video"
    )
)]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    video_id: VideoId,
    user: AuthUser,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let response = state
        .pipeline
        .get_for_owner(video_id.0, user.user_id)
        .await?;

    Ok(Json(response))
}
