use crate::models::ProductFeatures;
use crate::services::embedding_store::EmbeddingStore;
use crate::utils::{normalize_vector, stable_index};

const CATEGORY_BUMP: f32 = 1.0;
const PRICE_BUMP: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct EmbeddingBuilder {
    dimension: usize,
    price_scale: f64,
}

impl EmbeddingBuilder {
    pub fn new(dimension: usize, price_scale: f64) -> Self {
        Self {
            dimension,
            price_scale,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn build(&self, product: &ProductFeatures) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        let copied = product.features.len().min(self.dimension);
        embedding[..copied].copy_from_slice(&product.features[..copied]);

        if product.features.len() < self.dimension {
            let category_index = stable_index(&product.category, self.dimension);
            embedding[category_index] += CATEGORY_BUMP;

            let price_index = self.price_index(product.price);
            embedding[price_index] += PRICE_BUMP;
        }

        normalize_vector(&mut embedding);
        embedding
    }

    pub fn build_into(&self, store: &EmbeddingStore, product: &ProductFeatures) -> Vec<f32> {
        let embedding = self.build(product);
        store.put_product(&product.product_id, embedding.clone());
        embedding
    }

    pub fn price_index(&self, price: f64) -> usize {
        let buckets = (self.dimension / 4).max(1);
        let price = if price.is_finite() { price.max(0.0) } else { 0.0 };
        let fraction = price / (price + self.price_scale);

        ((fraction * buckets as f64).floor() as usize).min(buckets - 1)
    }
}
