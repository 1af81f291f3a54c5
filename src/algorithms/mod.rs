pub mod embedding;
pub mod initializer;
pub mod optimizer;
pub mod profile;
pub mod ranker;
pub mod scorer;

pub use embedding::EmbeddingBuilder;
pub use profile::{interaction_weight, UserProfileAggregator};
pub use ranker::{reason_for, Ranker};
pub use scorer::{CosineScorer, FeedForwardScorer, Scorer};

use crate::error::Result;
use std::sync::Arc;

/// A relevance function over a concatenated `[user | product]` vector.
///
/// Implementations must return a finite value; the [`Scorer`] clamps it
/// into `[0, 1]` before it reaches the ranker.
pub trait ScoringModel: Send + Sync {
    fn score(&self, input: &[f32]) -> Result<f64>;

    fn name(&self) -> &str {
        "scoring-model"
    }
}

impl<M: ScoringModel + ?Sized> ScoringModel for Arc<M> {
    fn score(&self, input: &[f32]) -> Result<f64> {
        (**self).score(input)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<M: ScoringModel> ScoringModel for parking_lot::RwLock<M> {
    fn score(&self, input: &[f32]) -> Result<f64> {
        self.read().score(input)
    }

    fn name(&self) -> &str {
        "shared-model"
    }
}
