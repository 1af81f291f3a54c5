use dashmap::DashMap;
use tracing::debug;

/// Owns the derived product and user embedding tables.
///
/// Every write replaces the whole entry for its key. Concurrent writers to
/// the same key race and the last one wins; callers that need a consistent
/// view across an update and a ranking call must serialize per key.
#[derive(Debug)]
pub struct EmbeddingStore {
    dimension: usize,
    products: DashMap<String, Vec<f32>>,
    users: DashMap<String, Vec<f32>>,
}

impl EmbeddingStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            products: DashMap::new(),
            users: DashMap::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn put_product(&self, product_id: &str, embedding: Vec<f32>) {
        debug_assert_eq!(embedding.len(), self.dimension);
        self.products.insert(product_id.to_string(), embedding);
    }

    pub fn product(&self, product_id: &str) -> Option<Vec<f32>> {
        self.products.get(product_id).map(|entry| entry.value().clone())
    }

    pub fn remove_product(&self, product_id: &str) -> Option<Vec<f32>> {
        self.products.remove(product_id).map(|(_, embedding)| embedding)
    }

    pub fn put_user(&self, user_id: &str, embedding: Vec<f32>) {
        debug_assert_eq!(embedding.len(), self.dimension);
        self.users.insert(user_id.to_string(), embedding);
    }

    pub fn user(&self, user_id: &str) -> Option<Vec<f32>> {
        self.users.get(user_id).map(|entry| entry.value().clone())
    }

    pub fn remove_user(&self, user_id: &str) -> Option<Vec<f32>> {
        self.users.remove(user_id).map(|(_, embedding)| embedding)
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn product_ids(&self) -> Vec<String> {
        self.products.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn clear(&self) {
        debug!(
            products = self.products.len(),
            users = self.users.len(),
            "Clearing embedding store"
        );
        self.products.clear();
        self.users.clear();
    }
}
