//! Application state.
//!
//! Built once at startup and shared as `Arc<AppState>`; nothing in it is mutated
//! after that.

use std::sync::Arc;

use vidkeep_core::Config;
use vidkeep_processing::IngestionPipeline;
use vidkeep_storage::Storage;

use crate::auth::JwtValidator;

pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<IngestionPipeline>,
    pub storage: Arc<dyn Storage>,
    pub jwt: Arc<JwtValidator>,
}

impl AppState {
    pub fn new(config: Config, pipeline: IngestionPipeline, storage: Arc<dyn Storage>) -> Self {
        let jwt = Arc::new(JwtValidator::new(config.jwt_secret()));
        Self {
            config,
            pipeline: Arc::new(pipeline),
            storage,
            jwt,
        }
    }
}
