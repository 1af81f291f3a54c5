pub fn score_variance(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }

    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n
}

pub fn personalization_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }

    (score_variance(scores) * 4.0).min(1.0)
}
