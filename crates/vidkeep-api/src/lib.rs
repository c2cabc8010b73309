//! vidkeep API library
//!
//! HTTP surface of the ingestion service: bearer-token identity, the upload and
//! read endpoints, signed media serving for the local backend, and startup.

mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
