//! vidkeep record store
//!
//! The pipeline only needs two operations on video rows: fetch by ID and
//! write back after a successful upload. Both are expressed by [`VideoRepository`];
//! the Postgres implementation is used in deployments and the in-memory one in
//! development and tests.

pub mod db;

pub use db::{
    create_video_repository, InMemoryVideoRepository, PostgresVideoRepository, RepositoryError,
    VideoRepository,
};
