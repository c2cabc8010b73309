//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use vidkeep_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "vidkeep API",
        version = "0.1.0",
        description = "Video ingestion API. Uploaded MP4 files are remuxed for streaming, stored in an object store, and returned with time-limited playback URLs."
    ),
    paths(
        handlers::video_upload::upload_video,
        handlers::video_get::get_video,
        handlers::health::health_check,
    ),
    components(schemas(
        models::VideoResponse,
        models::Orientation,
        error::ErrorResponse,
        handlers::health::HealthCheckResponse,
    )),
    tags(
        (name = "videos", description = "Video upload and retrieval"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
