use std::sync::Arc;

use crate::application::RetrievalService;
use crate::infrastructure::Config;

#[derive(Clone)]
pub struct AppState {
    pub retrieval: Arc<RetrievalService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(retrieval: Arc<RetrievalService>, config: Config) -> Self {
        Self {
            retrieval,
            config: Arc::new(config),
        }
    }

    pub fn key_field(&self) -> &str {
        &self.config.retrieval.key_field
    }
}
