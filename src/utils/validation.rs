use crate::models::*;
use anyhow::{anyhow, Result};

pub fn validate_product(product: &ProductFeatures) -> Result<()> {
    if product.product_id.is_empty() {
        return Err(anyhow!("Product ID cannot be empty"));
    }

    if product.category.len() > 100 {
        return Err(anyhow!("Product category too long (max 100 characters)"));
    }

    if !product.price.is_finite() || product.price < 0.0 {
        return Err(anyhow!("Product price must be a non-negative number"));
    }

    for &value in &product.features {
        if !value.is_finite() {
            return Err(anyhow!("Product features contain invalid values (NaN or Infinity)"));
        }
    }

    if !(0.0..=1.0).contains(&product.popularity) {
        return Err(anyhow!("Product popularity must be between 0.0 and 1.0"));
    }

    Ok(())
}

pub fn validate_interaction(interaction: &UserInteraction) -> Result<()> {
    if interaction.user_id.is_empty() {
        return Err(anyhow!("User ID cannot be empty"));
    }

    if interaction.product_id.is_empty() {
        return Err(anyhow!("Product ID cannot be empty"));
    }

    if let Some(rating) = interaction.rating {
        if !(1.0..=5.0).contains(&rating) {
            return Err(anyhow!("Rating must be between 1 and 5, got {}", rating));
        }
    }

    if let Some(seconds) = interaction.time_spent {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(anyhow!("Time spent must be a non-negative number of seconds"));
        }
    }

    // Validate timestamp is not too far in the future
    let max_future = chrono::Utc::now() + chrono::Duration::hours(1);
    if interaction.timestamp > max_future {
        return Err(anyhow!("Timestamp cannot be more than 1 hour in the future"));
    }

    Ok(())
}

pub fn validate_limit(limit: usize, max_limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(anyhow!("Number of recommendations must be greater than 0"));
    }

    if limit > max_limit {
        return Err(anyhow!(
            "Number of recommendations too large: {} (max {})",
            limit,
            max_limit
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product() {
        let valid = ProductFeatures::new("1", "ERP", vec![0.8, 0.6])
            .with_price(100_000.0)
            .with_popularity(0.85);
        assert!(validate_product(&valid).is_ok());

        let invalid = valid.clone().with_popularity(1.5);
        assert!(validate_product(&invalid).is_err());

        let negative_price = valid.with_price(-1.0);
        assert!(validate_product(&negative_price).is_err());
    }

    #[test]
    fn test_validate_interaction() {
        let valid = UserInteraction::new("u1", "p1", InteractionType::Like).with_rating(5.0);
        assert!(validate_interaction(&valid).is_ok());

        let bad_rating = UserInteraction::new("u1", "p1", InteractionType::Like).with_rating(0.0);
        assert!(validate_interaction(&bad_rating).is_err());

        let half_star = UserInteraction::new("u1", "p1", InteractionType::Like).with_rating(4.5);
        assert!(validate_interaction(&half_star).is_ok());

        let negative_time = UserInteraction::new("u1", "p1", InteractionType::View).with_time_spent(-3.0);
        assert!(validate_interaction(&negative_time).is_err());

        let infinite_time = UserInteraction::new("u1", "p1", InteractionType::View).with_time_spent(f32::INFINITY);
        assert!(validate_interaction(&infinite_time).is_err());

        let from_future = UserInteraction::new("u1", "p1", InteractionType::View)
            .at(chrono::Utc::now() + chrono::Duration::days(1));
        assert!(validate_interaction(&from_future).is_err());

        let no_user = UserInteraction::new("", "p1", InteractionType::View);
        assert!(validate_interaction(&no_user).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(5, 100).is_ok());
        assert!(validate_limit(0, 100).is_err());
        assert!(validate_limit(101, 100).is_err());
    }
}
