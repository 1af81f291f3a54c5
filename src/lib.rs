pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{RecommendationError, Result};
pub use models::*;

use algorithms::{CosineScorer, ScoringModel};
use services::embedding_store::EmbeddingStore;
use services::recommendation::RecommendationService;
use services::training::TrainingService;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    Cosine,
    FeedForward,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<EmbeddingStore>,
    pub recommendation_service: Arc<RecommendationService>,
    pub training_service: Arc<TrainingService>,
}

impl AppState {
    pub fn new(config: Config, scorer: ScorerKind) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(EmbeddingStore::new(config.recommendation.embedding_dim));

        let training_service = Arc::new(TrainingService::new(config.clone(), store.clone()));

        let model: Arc<dyn ScoringModel> = match scorer {
            ScorerKind::Cosine => Arc::new(CosineScorer),
            ScorerKind::FeedForward => training_service.model(),
        };

        let recommendation_service = Arc::new(RecommendationService::with_store(
            config.clone(),
            model,
            store.clone(),
        ));

        Self {
            config,
            store,
            recommendation_service,
            training_service,
        }
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
