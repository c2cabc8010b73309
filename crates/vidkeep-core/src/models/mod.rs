//! Data models for the application

mod storage;
mod video;

pub use storage::*;
pub use video::*;
