use vidkeep_core::AppError;

/// Failures of the local processing stages (staging, probe, remux).
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("staging failed: {0}")]
    Staging(#[from] std::io::Error),

    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("upload is empty")]
    Empty,

    #[error("probe failed: {0}")]
    Probe(String),

    #[error("remux failed: {0}")]
    Remux(String),

    #[error("invalid tool path: {0}")]
    InvalidToolPath(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Staging(e) => AppError::Staging(e.to_string()),
            ProcessingError::TooLarge { limit } => AppError::PayloadTooLarge(format!(
                "Video exceeds the maximum size of {} MB",
                limit / (1024 * 1024)
            )),
            ProcessingError::Empty => AppError::InvalidInput("Uploaded video is empty".to_string()),
            ProcessingError::Probe(msg) => AppError::Probe(msg),
            ProcessingError::Remux(msg) => AppError::Remux(msg),
            ProcessingError::InvalidToolPath(msg) => AppError::Internal(msg),
            ProcessingError::Cancelled => AppError::Internal("Request cancelled".to_string()),
        }
    }
}
