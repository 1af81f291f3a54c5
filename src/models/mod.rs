use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFeatures {
    pub product_id: String,
    pub category: String,
    pub price: f64,
    pub features: Vec<f32>,
    pub popularity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    View,
    Like,
    Purchase,
}

impl InteractionType {
    pub fn base_weight(&self) -> f32 {
        match self {
            InteractionType::View => 1.0,
            InteractionType::Like => 2.0,
            InteractionType::Purchase => 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInteraction {
    pub user_id: String,
    pub product_id: String,
    pub interaction_type: InteractionType,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub product_id: String,
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub user_id: String,
    pub recommendations: Vec<RecommendationItem>,
    pub personalization_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationReason {
    StrongMatch,
    BrowsingHistory,
    Trending,
    General,
}

impl RecommendationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationReason::StrongMatch => "strongly matches preferences",
            RecommendationReason::BrowsingHistory => "based on browsing history",
            RecommendationReason::Trending => "trending item",
            RecommendationReason::General => "you may be interested in this item",
        }
    }
}

impl fmt::Display for RecommendationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExample {
    pub user_id: String,
    pub product_id: String,
    pub label: f32,
    pub input: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub products: Vec<ProductFeatures>,
    #[serde(default)]
    pub interactions: Vec<UserInteraction>,
}

impl ProductFeatures {
    pub fn new(product_id: impl Into<String>, category: impl Into<String>, features: Vec<f32>) -> Self {
        Self {
            product_id: product_id.into(),
            category: category.into(),
            price: 0.0,
            features,
            popularity: 0.0,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity;
        self
    }
}

impl UserInteraction {
    pub fn new(
        user_id: impl Into<String>,
        product_id: impl Into<String>,
        interaction_type: InteractionType,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            product_id: product_id.into(),
            interaction_type,
            timestamp: Utc::now(),
            rating: None,
            time_spent: None,
        }
    }

    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_time_spent(mut self, seconds: f32) -> Self {
        self.time_spent = Some(seconds);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl RecommendationResult {
    pub fn scores(&self) -> Vec<f64> {
        self.recommendations.iter().map(|r| r.score).collect()
    }
}
