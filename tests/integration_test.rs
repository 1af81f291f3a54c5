use crmrec::algorithms::{interaction_weight, reason_for, CosineScorer, EmbeddingBuilder, Ranker, Scorer, ScoringModel};
use crmrec::services::embedding_store::EmbeddingStore;
use crmrec::services::recommendation::RecommendationService;
use crmrec::utils::l2_norm;
use crmrec::utils::metrics::personalization_score;
use crmrec::*;
use std::sync::Arc;

fn catalogue() -> Vec<ProductFeatures> {
    vec![
        ProductFeatures::new("1", "enterprise management", vec![0.8, 0.6, 0.9, 0.7])
            .with_price(100_000.0)
            .with_popularity(0.85),
        ProductFeatures::new("2", "data analytics", vec![0.9, 0.7, 0.5, 0.8])
            .with_price(80_000.0)
            .with_popularity(0.75),
        ProductFeatures::new("3", "customer relationship", vec![0.7, 0.8, 0.6, 0.9])
            .with_price(60_000.0)
            .with_popularity(0.9),
        ProductFeatures::new("4", "supply chain", vec![0.6, 0.9, 0.7, 0.8])
            .with_price(120_000.0)
            .with_popularity(0.7),
        ProductFeatures::new("5", "human resources", vec![0.7, 0.6, 0.8, 0.7])
            .with_price(50_000.0)
            .with_popularity(0.8),
    ]
}

fn cosine_service() -> RecommendationService {
    RecommendationService::new(Arc::new(Config::default()), Arc::new(CosineScorer))
}

#[test]
fn test_embeddings_are_unit_or_zero() {
    let service = cosine_service();
    for product in catalogue() {
        let embedding = service.build_product_embedding(&product);
        assert_eq!(embedding.len(), 32);
        assert!((l2_norm(&embedding) - 1.0).abs() < 1e-6);
    }

    let history = vec![
        UserInteraction::new("c1", "1", InteractionType::Purchase).with_rating(5.0),
        UserInteraction::new("c1", "3", InteractionType::View).with_time_spent(45.0),
    ];
    let user = service.update_user_embedding("c1", &history);
    assert!((l2_norm(&user) - 1.0).abs() < 1e-6);

    let empty = service.update_user_embedding("c2", &[UserInteraction::new("c2", "404", InteractionType::Like)]);
    assert_eq!(empty, vec![0.0; 32]);
}

#[test]
fn test_weight_formula() {
    let interaction = UserInteraction::new("c1", "1", InteractionType::Purchase)
        .with_rating(5.0)
        .with_time_spent(600.0);
    assert_eq!(interaction_weight(&interaction), 3.0);

    let zero_time_view = UserInteraction::new("c1", "1", InteractionType::View).with_time_spent(0.0);
    assert_eq!(interaction_weight(&zero_time_view), 1.0);
}

#[test]
fn test_personalization_scaling_and_empty() {
    assert!((personalization_score(&[0.2, 0.8]) - 0.36).abs() < 1e-12);
    assert_eq!(personalization_score(&[]), 0.0);
}

#[test]
fn test_missing_embedding_is_skipped() {
    let service = cosine_service();
    let products = catalogue();
    service.build_product_embedding(&products[0]);
    service.update_user_embedding("c1", &[UserInteraction::new("c1", "1", InteractionType::View)]);

    let candidates = vec![products[0].clone(), products[1].clone()];
    let result = service.generate_recommendations("c1", &candidates, None).unwrap();

    assert_eq!(result.recommendations.len(), 1);
    assert_eq!(result.recommendations[0].product_id, "1");
}

#[test]
fn test_insufficient_data_until_first_update() {
    let service = cosine_service();
    let products = catalogue();
    service.update_model(&[], &products);

    let err = service.generate_recommendations("newcomer", &products, None).unwrap_err();
    assert!(matches!(err, RecommendationError::InsufficientData { ref user_id } if user_id == "newcomer"));

    // an all-zero profile still counts as data
    service.update_user_embedding("newcomer", &[]);
    let result = service.generate_recommendations("newcomer", &products, None).unwrap();
    assert_eq!(result.recommendations.len(), 5);
    assert!(result.recommendations.iter().all(|r| r.score == 0.5));
}

#[test]
fn test_truncation_sorted_descending() {
    let store = EmbeddingStore::new(4);
    let builder = EmbeddingBuilder::new(4, 100_000.0);
    store.put_user("c1", vec![1.0, 0.0, 0.0, 0.0]);

    let candidates: Vec<ProductFeatures> = (0..10)
        .map(|i| {
            let product = ProductFeatures::new(format!("p{}", i), "suite", vec![1.0, i as f32 * 0.25, 0.0, 0.0]);
            builder.build_into(&store, &product);
            product
        })
        .collect();

    let ranker = Ranker::new(Scorer::new(Arc::new(CosineScorer), 4));
    let result = ranker.rank(&store, "c1", &candidates, 5).unwrap();

    assert_eq!(result.recommendations.len(), 5);
    let scores = result.scores();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(result.recommendations[0].product_id, "p0");
}

#[test]
fn test_reason_precedence() {
    assert_eq!(reason_for(0.85, 0.9).as_str(), "strongly matches preferences");
    assert_eq!(reason_for(0.65, 0.9).as_str(), "based on browsing history");
    assert_eq!(reason_for(0.3, 0.9).as_str(), "trending item");
    assert_eq!(reason_for(0.3, 0.2).as_str(), "you may be interested in this item");
}

struct FixedScores;

impl ScoringModel for FixedScores {
    fn score(&self, input: &[f32]) -> crmrec::Result<f64> {
        // product half carries the intended score in its first slot
        Ok(input[input.len() / 2] as f64)
    }
}

#[test]
fn test_reasons_attached_to_ranked_items() {
    let store = EmbeddingStore::new(2);
    store.put_user("c1", vec![1.0, 0.0]);
    store.put_product("strong", vec![0.85, 0.0]);
    store.put_product("hot", vec![0.3, 0.0]);

    let candidates = vec![
        ProductFeatures::new("hot", "x", vec![]).with_popularity(0.95),
        ProductFeatures::new("strong", "x", vec![]).with_popularity(0.9),
    ];
    let ranker = Ranker::new(Scorer::new(Arc::new(FixedScores), 2));
    let result = ranker.rank(&store, "c1", &candidates, 5).unwrap();

    assert_eq!(result.recommendations[0].product_id, "strong");
    assert_eq!(result.recommendations[0].reason, "strongly matches preferences");
    assert_eq!(result.recommendations[1].reason, "trending item");

    let expected = personalization_score(&result.scores());
    assert_eq!(result.personalization_score, expected);
}

#[test]
fn test_app_state_with_trained_model() {
    let mut config = Config::default();
    config.training.epochs = 2;
    let state = AppState::new(config, ScorerKind::FeedForward);

    let products = catalogue();
    let interactions = vec![
        UserInteraction::new("c1", "2", InteractionType::View).with_time_spent(180.0),
        UserInteraction::new("c1", "3", InteractionType::Like).with_rating(4.0),
    ];
    state.recommendation_service.update_model(&interactions, &products);
    let stats = state.training_service.train(&interactions).unwrap();
    assert_eq!(stats.positive_examples, 2);

    let result = state
        .recommendation_service
        .generate_recommendations("c1", &products, Some(3))
        .unwrap();
    assert_eq!(result.recommendations.len(), 3);
    assert!(result
        .recommendations
        .iter()
        .all(|r| (0.0..=1.0).contains(&r.score)));
    assert!((0.0..=1.0).contains(&result.personalization_score));
}

#[test]
fn test_dataset_wire_format() {
    let json = r#"{
        "products": [
            { "productId": "1", "category": "ERP", "price": 100000, "features": [0.8, 0.6], "popularity": 0.85 }
        ],
        "interactions": [
            { "userId": "c1", "productId": "1", "interactionType": "view",
              "timestamp": "2024-01-01T00:00:00Z", "timeSpent": 120 },
            { "userId": "c1", "productId": "1", "interactionType": "like",
              "timestamp": "2024-01-02T00:00:00Z", "timeSpent": 12.5, "rating": 4.5 }
        ]
    }"#;
    let dataset: Dataset = serde_json::from_str(json).unwrap();
    assert_eq!(dataset.products[0].price, 100_000.0);
    assert_eq!(dataset.interactions[0].time_spent, Some(120.0));
    assert_eq!(dataset.interactions[1].time_spent, Some(12.5));
    assert_eq!(dataset.interactions[1].rating, Some(4.5));

    let result = RecommendationResult {
        user_id: "c1".to_string(),
        recommendations: Vec::new(),
        personalization_score: 0.0,
    };
    let value = serde_json::to_value(&result).unwrap();
    assert!(value.get("personalizationScore").is_some());
}
