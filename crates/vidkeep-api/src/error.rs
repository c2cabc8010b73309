//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything that converts into
//! `AppError` (repository, storage and processing errors) converts into `HttpAppError` via
//! `?`, so every failure renders the same way: status from [`ErrorMetadata`], a JSON
//! [`ErrorResponse`] body, and a log line at the error's own level.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vidkeep_core::{AppError, ErrorMetadata, LogLevel};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Error taxonomy kind, e.g. `RemuxError`
    pub kind: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client (e.g., "Reduce file size")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from vidkeep-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl<E> From<E> for HttpAppError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        HttpAppError(err.into())
    }
}

/// Map a multipart parse failure, keeping axum's own 413 for oversize bodies.
pub fn multipart_error(err: MultipartError) -> HttpAppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        HttpAppError(AppError::PayloadTooLarge(err.body_text()))
    } else {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid multipart body: {}",
            err.body_text()
        )))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl ErrorResponse {
    fn from_app_error(app_error: &AppError, show_details: bool) -> Self {
        Self {
            error: app_error.client_message(),
            code: app_error.error_code().to_string(),
            kind: app_error.error_type().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
            details: show_details.then(|| app_error.detailed_message()),
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Details never leave the process in production or for sensitive kinds
        let show_details = !is_production_env() && !app_error.is_sensitive();
        let body = ErrorResponse::from_app_error(app_error, show_details);

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidkeep_processing::ProcessingError;
    use vidkeep_storage::StorageError;

    #[test]
    fn test_from_processing_error() {
        let HttpAppError(app_err) = ProcessingError::Remux("bad container".to_string()).into();
        assert!(matches!(app_err, AppError::Remux(_)));
    }

    #[test]
    fn test_from_storage_error() {
        let HttpAppError(app_err) = StorageError::UploadFailed("503".to_string()).into();
        assert!(matches!(app_err, AppError::Upload(_)));
    }

    #[test]
    fn test_sensitive_error_hides_details() {
        let err = AppError::Staging("/tmp/vidkeep-abc/upload.mp4: No space left".to_string());
        let body = ErrorResponse::from_app_error(&err, !err.is_sensitive());
        assert_eq!(body.kind, "StagingError");
        assert!(body.details.is_none());
        assert!(!body.error.contains("/tmp"));
    }

    /// Verifies the public error response contract: serialized ErrorResponse has "error",
    /// "code", "kind", "recoverable", and optionally "details" / "suggested_action".
    #[test]
    fn test_error_response_shape() {
        let err = AppError::Forbidden("You do not own this video".to_string());
        let body = ErrorResponse::from_app_error(&err, true);
        let json = serde_json::to_value(&body).expect("serialize");

        assert_eq!(json["code"], "OWNERSHIP_ERROR");
        assert_eq!(json["kind"], "OwnershipError");
        assert_eq!(json["recoverable"], false);
        assert!(json["details"].as_str().is_some());
        assert!(json["suggested_action"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_into_response_status() {
        let response = HttpAppError(AppError::Probe("Could not read video metadata".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
