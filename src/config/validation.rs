use crate::config::types::{
    BrowserConfig, Config, EnumerationConfig, ExtractionConfig, ScoringConfig, StateConfig,
    ValidationConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_enumeration_config(&config.enumeration)?;
    validate_extraction_config(&config.extraction)?;
    validate_validation_config(&config.validation)?;
    validate_scoring_config(&config.scoring)?;
    validate_state_config(&config.state)?;
    validate_browser_config(&config.browser)?;
    Ok(())
}

fn validate_enumeration_config(config: &EnumerationConfig) -> Result<(), ConfigError> {
    if config.max_rounds < 1 {
        return Err(ConfigError::Validation(
            "max-rounds must be >= 1".to_string(),
        ));
    }

    if config.no_change_limit < 1 {
        return Err(ConfigError::Validation(
            "no-change-limit must be >= 1".to_string(),
        ));
    }

    if config.round_delay_min_ms > config.round_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "round-delay-min-ms ({}) must not exceed round-delay-max-ms ({})",
            config.round_delay_min_ms, config.round_delay_max_ms
        )));
    }

    if config.scroll_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "scroll-timeout-ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.render_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "render-timeout-ms must be > 0".to_string(),
        ));
    }

    if config.delay_min_ms > config.delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "delay-min-ms ({}) must not exceed delay-max-ms ({})",
            config.delay_min_ms, config.delay_max_ms
        )));
    }

    if config.max_consecutive_failures < 1 {
        return Err(ConfigError::Validation(
            "max-consecutive-failures must be >= 1".to_string(),
        ));
    }

    if config.save_interval < 1 {
        return Err(ConfigError::Validation(
            "save-interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_validation_config(config: &ValidationConfig) -> Result<(), ConfigError> {
    config
        .default_region
        .parse::<phonenumber::country::Id>()
        .map_err(|_| {
            ConfigError::Validation(format!(
                "default-region '{}' is not a known ISO 3166 region",
                config.default_region
            ))
        })?;

    if config.website_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "website-timeout-secs must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_scoring_config(config: &ScoringConfig) -> Result<(), ConfigError> {
    if !(0..=100).contains(&config.max_score) {
        return Err(ConfigError::Validation(format!(
            "max-score must be between 0 and 100, got {}",
            config.max_score
        )));
    }

    if config.base_score < 0 || config.base_score > config.max_score {
        return Err(ConfigError::Validation(format!(
            "base-score must be between 0 and max-score ({}), got {}",
            config.max_score, config.base_score
        )));
    }

    if config.low_rating_threshold > config.high_rating_threshold {
        return Err(ConfigError::Validation(format!(
            "low-rating-threshold ({}) must not exceed high-rating-threshold ({})",
            config.low_rating_threshold, config.high_rating_threshold
        )));
    }

    if config.low_reviews_threshold > config.high_reviews_threshold {
        return Err(ConfigError::Validation(format!(
            "low-reviews-threshold ({}) must not exceed high-reviews-threshold ({})",
            config.low_reviews_threshold, config.high_reviews_threshold
        )));
    }

    Ok(())
}

fn validate_state_config(config: &StateConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "state directory cannot be empty".to_string(),
        ));
    }

    if config.max_backups < 1 {
        return Err(ConfigError::Validation(
            "max-backups must be >= 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if !config.search_url.contains("{query}") {
        return Err(ConfigError::Validation(format!(
            "search-url must contain a {{query}} placeholder, got '{}'",
            config.search_url
        )));
    }

    let sample = config
        .search_url
        .replace("{query}", "test")
        .replace("{page}", "1");
    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search-url: {}", e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "search-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    let selectors = [
        ("listing-selector", &config.listing_selector),
        ("name", &config.selectors.name),
        ("category", &config.selectors.category),
        ("address", &config.selectors.address),
        ("phone", &config.selectors.phone),
        ("website", &config.selectors.website),
        ("rating", &config.selectors.rating),
        ("reviews", &config.selectors.reviews),
    ];
    for (field, selector) in selectors {
        if Selector::parse(selector).is_err() {
            return Err(ConfigError::InvalidSelector {
                field: field.to_string(),
                selector: selector.clone(),
            });
        }
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be > 0".to_string(),
        ));
    }

    Ok(())
}
