use super::scorer::Scorer;
use crate::error::Result;
use crate::models::{ProductFeatures, RecommendationItem, RecommendationReason, RecommendationResult};
use crate::services::embedding_store::EmbeddingStore;
use crate::utils::metrics::personalization_score;
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

const STRONG_MATCH_THRESHOLD: f64 = 0.8;
const HISTORY_MATCH_THRESHOLD: f64 = 0.6;
const TRENDING_POPULARITY: f64 = 0.8;

pub fn reason_for(score: f64, popularity: f64) -> RecommendationReason {
    if score > STRONG_MATCH_THRESHOLD {
        RecommendationReason::StrongMatch
    } else if score > HISTORY_MATCH_THRESHOLD {
        RecommendationReason::BrowsingHistory
    } else if popularity > TRENDING_POPULARITY {
        RecommendationReason::Trending
    } else {
        RecommendationReason::General
    }
}

#[derive(Clone)]
pub struct Ranker {
    scorer: Scorer,
    parallel: bool,
}

impl Ranker {
    pub fn new(scorer: Scorer) -> Self {
        Self {
            scorer,
            parallel: false,
        }
    }

    pub fn with_parallel_scoring(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    fn score_candidate<'a>(
        &self,
        user_embedding: &[f32],
        product: &'a ProductFeatures,
        embedding: &[f32],
    ) -> Result<(&'a ProductFeatures, f64)> {
        let score = self.scorer.score(user_embedding, embedding)?;
        Ok((product, score))
    }

    // any scoring failure fails the whole call
    pub fn rank(
        &self,
        store: &EmbeddingStore,
        user_id: &str,
        candidates: &[ProductFeatures],
        limit: usize,
    ) -> Result<RecommendationResult> {
        let user_embedding = self.scorer.user_embedding(store, user_id)?;

        let resolvable: Vec<(&ProductFeatures, Vec<f32>)> = candidates
            .iter()
            .filter_map(|product| match store.product(&product.product_id) {
                Some(embedding) => Some((product, embedding)),
                None => {
                    debug!(product_id = %product.product_id, "Dropping candidate without embedding");
                    None
                }
            })
            .collect();

        let mut scored: Vec<(&ProductFeatures, f64)> = if self.parallel {
            resolvable
                .par_iter()
                .map(|(product, embedding)| self.score_candidate(&user_embedding, product, embedding))
                .collect::<Result<_>>()?
        } else {
            resolvable
                .iter()
                .map(|(product, embedding)| self.score_candidate(&user_embedding, product, embedding))
                .collect::<Result<_>>()?
        };

        // stable: equal scores keep candidate order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(limit);

        let recommendations: Vec<RecommendationItem> = scored
            .into_iter()
            .map(|(product, score)| RecommendationItem {
                product_id: product.product_id.clone(),
                score,
                reason: reason_for(score, product.popularity).to_string(),
            })
            .collect();

        let scores: Vec<f64> = recommendations.iter().map(|r| r.score).collect();

        Ok(RecommendationResult {
            user_id: user_id.to_string(),
            personalization_score: personalization_score(&scores),
            recommendations,
        })
    }
}
