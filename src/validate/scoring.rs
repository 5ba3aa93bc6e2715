use crate::config::ScoringConfig;
use crate::model::{BusinessRecord, Field};

/// Computes the lead score for a validated record
///
/// Starts from the base score and adds:
/// - no website at all, or a website that failed the probe (mutually exclusive)
/// - a high rating, or a low rating
/// - few reviews (new business), or many reviews (established business)
///
/// The result is clamped to `0..=max-score`. Absent rating or review fields
/// contribute nothing; an absent website earns the no-website bonus.
pub fn lead_score(record: &BusinessRecord, config: &ScoringConfig) -> u8 {
    let mut score = config.base_score;

    score += website_bonus(record, config);
    score += rating_bonus(&record.rating, config);
    score += reviews_bonus(&record.review_count, config);

    score.clamp(0, config.max_score.clamp(0, 100)) as u8
}

fn website_bonus(record: &BusinessRecord, config: &ScoringConfig) -> i32 {
    match &record.website {
        Field::Absent => config.no_website_bonus,
        Field::Value(_) if !record.website_valid => config.invalid_website_bonus,
        Field::Value(_) => 0,
    }
}

fn rating_bonus(rating: &Field<f32>, config: &ScoringConfig) -> i32 {
    match rating {
        Field::Value(r) if *r >= config.high_rating_threshold => config.high_rating_bonus,
        Field::Value(r) if *r < config.low_rating_threshold => config.low_rating_bonus,
        _ => 0,
    }
}

fn reviews_bonus(reviews: &Field<u32>, config: &ScoringConfig) -> i32 {
    match reviews {
        Field::Value(n) if *n > config.high_reviews_threshold => config.high_reviews_bonus,
        Field::Value(n) if *n < config.low_reviews_threshold => config.low_reviews_bonus,
        _ => 0,
    }
}
