//! Database repositories for data access layer
//
// Video repository trait, Postgres implementation and factory
pub mod video;
//
// In-memory implementation for development and tests
pub mod memory;

pub use memory::InMemoryVideoRepository;
pub use video::{create_video_repository, PostgresVideoRepository, RepositoryError, VideoRepository};
