use crate::models::UserInteraction;
use crate::services::embedding_store::EmbeddingStore;
use crate::utils::{add_scaled, normalize_vector};
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_TIME_SPENT_CAP_SECS: f32 = 300.0;

pub fn interaction_weight(interaction: &UserInteraction) -> f32 {
    weight_with_cap(interaction, DEFAULT_TIME_SPENT_CAP_SECS)
}

// Zero and NaN count as absent, so they leave the weight untouched.
fn present(value: Option<f32>) -> Option<f32> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

fn weight_with_cap(interaction: &UserInteraction, time_cap_secs: f32) -> f32 {
    let mut weight = interaction.interaction_type.base_weight();

    if let Some(rating) = present(interaction.rating) {
        weight *= rating / 5.0;
    }

    if let Some(seconds) = present(interaction.time_spent) {
        weight *= (seconds / time_cap_secs).min(1.0);
    }

    weight
}

#[derive(Debug, Clone)]
pub struct UserProfileAggregator {
    time_spent_cap_secs: f32,
}

impl Default for UserProfileAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_SPENT_CAP_SECS)
    }
}

impl UserProfileAggregator {
    pub fn new(time_spent_cap_secs: f32) -> Self {
        Self { time_spent_cap_secs }
    }

    pub fn weight(&self, interaction: &UserInteraction) -> f32 {
        weight_with_cap(interaction, self.time_spent_cap_secs)
    }

    // written even when nothing resolves, leaving the zero vector
    pub fn update_user_embedding(
        &self,
        store: &EmbeddingStore,
        user_id: &str,
        interactions: &[UserInteraction],
    ) -> Vec<f32> {
        let mut embedding = vec![0.0f32; store.dimension()];

        for interaction in interactions.iter().filter(|i| i.user_id == user_id) {
            let Some(product_embedding) = store.product(&interaction.product_id) else {
                debug!(
                    user_id,
                    product_id = %interaction.product_id,
                    "Skipping interaction with unknown product"
                );
                continue;
            };

            add_scaled(&mut embedding, &product_embedding, self.weight(interaction));
        }

        normalize_vector(&mut embedding);
        store.put_user(user_id, embedding.clone());
        embedding
    }
}

pub fn group_by_user(interactions: &[UserInteraction]) -> Vec<(String, Vec<UserInteraction>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<UserInteraction>> = HashMap::new();

    for interaction in interactions {
        groups
            .entry(interaction.user_id.clone())
            .or_insert_with(|| {
                order.push(interaction.user_id.clone());
                Vec::new()
            })
            .push(interaction.clone());
    }

    order
        .into_iter()
        .filter_map(|user_id| groups.remove(&user_id).map(|history| (user_id, history)))
        .collect()
}
