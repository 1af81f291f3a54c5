use crate::algorithms::optimizer::Adam;
use crate::algorithms::profile::UserProfileAggregator;
use crate::algorithms::FeedForwardScorer;
use crate::config::Config;
use crate::error::{RecommendationError, Result};
use crate::models::*;
use crate::services::embedding_store::EmbeddingStore;
use crate::utils::concat;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub positive_examples: usize,
    pub negative_examples: usize,
    pub epochs_run: usize,
    pub last_loss: Option<f64>,
    pub last_trained_at: Option<DateTime<Utc>>,
}

pub struct TrainingService {
    store: Arc<EmbeddingStore>,
    model: Arc<RwLock<FeedForwardScorer>>,
    config: Arc<Config>,
    aggregator: UserProfileAggregator,
    stats: RwLock<TrainingStats>,
    rng: Mutex<StdRng>,
}

impl TrainingService {
    pub fn new(config: Arc<Config>, store: Arc<EmbeddingStore>) -> Self {
        let model = FeedForwardScorer::from_config(config.recommendation.embedding_dim, &config.model);
        Self::with_model(config, store, model)
    }

    pub fn with_model(config: Arc<Config>, store: Arc<EmbeddingStore>, model: FeedForwardScorer) -> Self {
        let aggregator = UserProfileAggregator::new(config.recommendation.time_spent_cap_secs);
        let rng = StdRng::seed_from_u64(config.model.seed);

        Self {
            store,
            model: Arc::new(RwLock::new(model)),
            config,
            aggregator,
            stats: RwLock::new(TrainingStats::default()),
            rng: Mutex::new(rng),
        }
    }

    pub fn model(&self) -> Arc<RwLock<FeedForwardScorer>> {
        self.model.clone()
    }

    pub fn stats(&self) -> TrainingStats {
        self.stats.read().clone()
    }

    pub fn build_examples(&self, interactions: &[UserInteraction]) -> Vec<TrainingExample> {
        self.collect_examples(interactions).0
    }

    fn collect_examples(&self, interactions: &[UserInteraction]) -> (Vec<TrainingExample>, usize) {
        let max_weight = InteractionType::Purchase.base_weight();
        let mut positives = Vec::new();
        let mut touched: HashMap<String, HashSet<String>> = HashMap::new();

        for interaction in interactions {
            let (Some(user), Some(product)) = (
                self.store.user(&interaction.user_id),
                self.store.product(&interaction.product_id),
            ) else {
                continue;
            };

            touched
                .entry(interaction.user_id.clone())
                .or_default()
                .insert(interaction.product_id.clone());

            positives.push(TrainingExample {
                user_id: interaction.user_id.clone(),
                product_id: interaction.product_id.clone(),
                label: (self.aggregator.weight(interaction) / max_weight).clamp(0.0, 1.0),
                input: concat(&user, &product),
            });
        }

        let positive_count = positives.len();
        let negatives = self.sample_negatives(&positives, &touched);
        positives.extend(negatives);
        (positives, positive_count)
    }

    fn sample_negatives(
        &self,
        positives: &[TrainingExample],
        touched: &HashMap<String, HashSet<String>>,
    ) -> Vec<TrainingExample> {
        let ratio = self.config.training.negative_sampling_ratio;
        if ratio <= 0.0 {
            return Vec::new();
        }

        // sorted so sampling depends only on the seed, not on map order
        let catalogue: BTreeSet<String> = self.store.product_ids().into_iter().collect();
        let mut per_user: Vec<(&String, usize)> = Vec::new();
        for example in positives {
            match per_user.iter_mut().find(|(user_id, _)| **user_id == example.user_id) {
                Some((_, count)) => *count += 1,
                None => per_user.push((&example.user_id, 1)),
            }
        }

        let mut rng = self.rng.lock();
        let mut negatives = Vec::new();
        for (user_id, count) in per_user {
            let Some(user) = self.store.user(user_id) else {
                continue;
            };
            let seen = &touched[user_id];
            let pool: Vec<&String> = catalogue.iter().filter(|id| !seen.contains(*id)).collect();
            let wanted = ((count as f32 * ratio).round() as usize).min(pool.len());

            for product_id in pool.choose_multiple(&mut *rng, wanted) {
                if let Some(product) = self.store.product(product_id) {
                    negatives.push(TrainingExample {
                        user_id: user_id.clone(),
                        product_id: (*product_id).clone(),
                        label: 0.0,
                        input: concat(&user, &product),
                    });
                }
            }
        }
        negatives
    }

    pub fn train(&self, interactions: &[UserInteraction]) -> Result<TrainingStats> {
        let (mut examples, positives) = self.collect_examples(interactions);
        if examples.is_empty() {
            warn!("No resolvable interactions, skipping training");
            return Ok(self.stats());
        }

        examples.shuffle(&mut *self.rng.lock());

        let epochs = self.config.training.epochs;
        let mut optimizer = Adam::with_learning_rate(self.config.training.learning_rate);
        let loss = self
            .model
            .write()
            .train(&examples, epochs, self.config.training.batch_size, &mut optimizer)?;

        let mut stats = self.stats.write();
        stats.positive_examples = positives;
        stats.negative_examples = examples.len() - positives;
        stats.epochs_run += epochs;
        stats.last_loss = Some(loss);
        stats.last_trained_at = Some(Utc::now());

        info!(
            "Trained scoring model on {} examples for {} epochs (loss {:.4})",
            examples.len(),
            epochs,
            loss
        );
        Ok(stats.clone())
    }

    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<()> {
        self.model.read().save(path)
    }

    pub fn load_model(&self, path: impl AsRef<Path>) -> Result<()> {
        let loaded = FeedForwardScorer::load(path, self.config.model.seed)?;
        let expected = self.config.recommendation.embedding_dim * 2;
        if loaded.input_dim() != expected {
            return Err(RecommendationError::DimensionMismatch {
                expected,
                actual: loaded.input_dim(),
            });
        }

        *self.model.write() = loaded;
        Ok(())
    }
}
