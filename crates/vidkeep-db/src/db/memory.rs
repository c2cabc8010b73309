use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;
use vidkeep_core::VideoRecord;

use super::video::{RepositoryError, VideoRepository};

/// Process-local video store. Rows live only as long as the process.
#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<Uuid, VideoRecord>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.videos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.videos.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, RepositoryError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn update_video(&self, video: &VideoRecord) -> Result<(), RepositoryError> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(video.id)),
        }
    }

    async fn create_video(&self, video: &VideoRecord) -> Result<(), RepositoryError> {
        self.videos.write().await.insert(video.id, video.clone());
        Ok(())
    }
}
