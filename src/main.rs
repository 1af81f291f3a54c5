use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crmrec::utils::validation::{validate_interaction, validate_limit, validate_product};
use crmrec::{init_tracing, AppState, Config, Dataset, ScorerKind};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const MAX_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScorerArg {
    Cosine,
    Mlp,
}

impl From<ScorerArg> for ScorerKind {
    fn from(arg: ScorerArg) -> Self {
        match arg {
            ScorerArg::Cosine => ScorerKind::Cosine,
            ScorerArg::Mlp => ScorerKind::FeedForward,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Rank products for a CRM customer", long_about = None)]
struct Args {
    /// JSON file with `products` and `interactions` arrays
    #[arg(short, long)]
    data: PathBuf,

    /// Customer to recommend for
    #[arg(short, long)]
    user: String,

    #[arg(short, long)]
    limit: Option<usize>,

    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(long, value_enum, default_value = "cosine")]
    scorer: ScorerArg,

    /// Weights to load into the feed-forward scorer
    #[arg(long)]
    model: Option<PathBuf>,

    /// Fit the feed-forward scorer on the interaction log before ranking
    #[arg(long)]
    train: bool,

    #[arg(long)]
    save_model: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let mut dataset: Dataset = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse dataset {}", path.display()))?;

    dataset.products.retain(|product| match validate_product(product) {
        Ok(()) => true,
        Err(e) => {
            warn!("Skipping product {}: {}", product.product_id, e);
            false
        }
    });
    dataset.interactions.retain(|interaction| match validate_interaction(interaction) {
        Ok(()) => true,
        Err(e) => {
            warn!("Skipping interaction {} -> {}: {}", interaction.user_id, interaction.product_id, e);
            false
        }
    });

    Ok(dataset)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", &args.log_level);
    }
    init_tracing();

    let config = if Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    if let Some(limit) = args.limit {
        validate_limit(limit, MAX_LIMIT)?;
    }

    let dataset = load_dataset(&args.data)?;
    info!(
        "Loaded {} products and {} interactions",
        dataset.products.len(),
        dataset.interactions.len()
    );

    let scorer: ScorerKind = args.scorer.into();
    let state = AppState::new(config, scorer);

    if let Some(path) = &args.model {
        state.training_service.load_model(path)?;
    }

    state
        .recommendation_service
        .update_model(&dataset.interactions, &dataset.products);

    if args.train {
        if scorer != ScorerKind::FeedForward {
            warn!("--train only affects the mlp scorer");
        }
        let stats = state.training_service.train(&dataset.interactions)?;
        info!("Training stats: {:?}", stats);
    }

    if let Some(path) = &args.save_model {
        state.training_service.save_model(path)?;
    }

    let result = state
        .recommendation_service
        .generate_recommendations(&args.user, &dataset.products, args.limit)
        .map_err(|e| {
            if e.is_insufficient_data() {
                anyhow::anyhow!("Not enough interaction data for {} to recommend products", args.user)
            } else {
                anyhow::Error::new(e).context("Failed to generate recommendations")
            }
        })?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
