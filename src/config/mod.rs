use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub recommendation: RecommendationConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub embedding_dim: usize,
    pub default_limit: usize,
    pub time_spent_cap_secs: f32,
    pub price_scale: f64,
    pub parallel_scoring: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub hidden_units: [usize; 2],
    pub dropout_rate: f32,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub batch_size: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    pub negative_sampling_ratio: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recommendation: RecommendationConfig {
                embedding_dim: 32,
                default_limit: 5,
                time_spent_cap_secs: 300.0,
                price_scale: 100_000.0,
                parallel_scoring: false,
            },
            model: ModelConfig {
                hidden_units: [64, 32],
                dropout_rate: 0.3,
                seed: 42,
            },
            training: TrainingConfig {
                batch_size: 32,
                learning_rate: 0.001,
                epochs: 10,
                negative_sampling_ratio: 1.0,
            },
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("CRMREC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.recommendation.embedding_dim == 0 {
            return Err(anyhow!("Embedding dimension must be greater than 0"));
        }

        if self.recommendation.default_limit == 0 {
            return Err(anyhow!("Default recommendation limit must be greater than 0"));
        }

        if self.recommendation.time_spent_cap_secs <= 0.0 {
            return Err(anyhow!("Time spent cap must be positive"));
        }

        if self.recommendation.price_scale <= 0.0 {
            return Err(anyhow!("Price scale must be positive"));
        }

        if self.model.hidden_units.iter().any(|&units| units == 0) {
            return Err(anyhow!("Hidden layers must have at least one unit"));
        }

        if !(0.0..1.0).contains(&self.model.dropout_rate) {
            return Err(anyhow!("Dropout rate must be in [0, 1)"));
        }

        if self.training.batch_size == 0 {
            return Err(anyhow!("Batch size cannot be zero"));
        }

        if self.training.negative_sampling_ratio < 0.0 {
            return Err(anyhow!("Negative sampling ratio cannot be negative"));
        }

        Ok(())
    }
}
