use crate::algorithms::profile::group_by_user;
use crate::algorithms::{EmbeddingBuilder, Ranker, Scorer, ScoringModel, UserProfileAggregator};
use crate::config::Config;
use crate::error::Result;
use crate::models::*;
use crate::services::embedding_store::EmbeddingStore;
use std::sync::Arc;
use tracing::{debug, info};

pub struct RecommendationService {
    store: Arc<EmbeddingStore>,
    builder: EmbeddingBuilder,
    aggregator: UserProfileAggregator,
    ranker: Ranker,
    config: Arc<Config>,
}

impl RecommendationService {
    pub fn new(config: Arc<Config>, model: Arc<dyn ScoringModel>) -> Self {
        let store = Arc::new(EmbeddingStore::new(config.recommendation.embedding_dim));
        Self::with_store(config, model, store)
    }

    pub fn with_store(config: Arc<Config>, model: Arc<dyn ScoringModel>, store: Arc<EmbeddingStore>) -> Self {
        let dimension = config.recommendation.embedding_dim;
        let builder = EmbeddingBuilder::new(dimension, config.recommendation.price_scale);
        let aggregator = UserProfileAggregator::new(config.recommendation.time_spent_cap_secs);
        let ranker = Ranker::new(Scorer::new(model, dimension))
            .with_parallel_scoring(config.recommendation.parallel_scoring);

        info!(
            "Initialized recommendation service (dimension {}, model {})",
            dimension,
            ranker.scorer().model_name()
        );

        Self {
            store,
            builder,
            aggregator,
            ranker,
            config,
        }
    }

    pub fn store(&self) -> &Arc<EmbeddingStore> {
        &self.store
    }

    pub fn build_product_embedding(&self, product: &ProductFeatures) -> Vec<f32> {
        self.builder.build_into(&self.store, product)
    }

    pub fn update_user_embedding(&self, user_id: &str, interactions: &[UserInteraction]) -> Vec<f32> {
        self.aggregator.update_user_embedding(&self.store, user_id, interactions)
    }

    pub fn update_model(&self, interactions: &[UserInteraction], products: &[ProductFeatures]) {
        for product in products {
            self.build_product_embedding(product);
        }

        let groups = group_by_user(interactions);
        for (user_id, history) in &groups {
            self.update_user_embedding(user_id, history);
        }

        info!(
            "Updated recommendation model: {} products, {} users",
            products.len(),
            groups.len()
        );
    }

    pub fn generate_recommendations(
        &self,
        user_id: &str,
        candidates: &[ProductFeatures],
        limit: Option<usize>,
    ) -> Result<RecommendationResult> {
        let limit = limit.unwrap_or(self.config.recommendation.default_limit);
        let result = self.ranker.rank(&self.store, user_id, candidates, limit)?;

        debug!(
            user_id,
            returned = result.recommendations.len(),
            personalization = result.personalization_score,
            "Generated recommendations"
        );
        Ok(result)
    }

    pub fn clear_user(&self, user_id: &str) -> bool {
        self.store.remove_user(user_id).is_some()
    }

    pub fn reset(&self) {
        self.store.clear();
        info!("Recommendation state reset");
    }
}
