//! vidkeep core library
//!
//! Domain models, error taxonomy and configuration shared by every vidkeep crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, VideoServiceConfig};
pub use error::{AppError, ErrorKind, ErrorMetadata, LogLevel};
pub use models::{LocatorError, Orientation, StorageLocator, VideoRecord, VideoResponse};
pub use storage_types::StorageBackend;
