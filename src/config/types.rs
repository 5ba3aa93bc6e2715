use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Leadscout
///
/// Every section is optional in the TOML file; missing keys fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub enumeration: EnumerationConfig,
    pub extraction: ExtractionConfig,
    pub validation: ValidationConfig,
    pub scoring: ScoringConfig,
    pub state: StateConfig,
    pub browser: BrowserConfig,
}

/// Listing enumeration (infinite-scroll collection) policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnumerationConfig {
    /// Hard cap on scroll rounds, regardless of progress
    #[serde(rename = "max-rounds")]
    pub max_rounds: u32,

    /// Consecutive rounds without a new identifier before the source counts as exhausted
    #[serde(rename = "no-change-limit")]
    pub no_change_limit: u32,

    /// Lower bound of the randomized pause after each round (milliseconds)
    #[serde(rename = "round-delay-min-ms")]
    pub round_delay_min_ms: u64,

    /// Upper bound of the randomized pause after each round (milliseconds)
    #[serde(rename = "round-delay-max-ms")]
    pub round_delay_max_ms: u64,

    /// Timeout for a single scroll-and-read round (milliseconds)
    #[serde(rename = "scroll-timeout-ms")]
    pub scroll_timeout_ms: u64,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 50,
            no_change_limit: 8,
            round_delay_min_ms: 800,
            round_delay_max_ms: 2000,
            scroll_timeout_ms: 15_000,
        }
    }
}

impl EnumerationConfig {
    pub fn scroll_timeout(&self) -> Duration {
        Duration::from_millis(self.scroll_timeout_ms)
    }
}

/// Per-candidate extraction policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Timeout for rendering one listing's detail view (milliseconds)
    #[serde(rename = "render-timeout-ms")]
    pub render_timeout_ms: u64,

    /// Lower bound of the pause between candidates (milliseconds)
    #[serde(rename = "delay-min-ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the pause between candidates (milliseconds)
    #[serde(rename = "delay-max-ms")]
    pub delay_max_ms: u64,

    /// Circuit breaker: stop after this many consecutive candidate failures
    #[serde(rename = "max-consecutive-failures")]
    pub max_consecutive_failures: u32,

    /// Persist session state every N processed candidates
    #[serde(rename = "save-interval")]
    pub save_interval: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            render_timeout_ms: 30_000,
            delay_min_ms: 1000,
            delay_max_ms: 3000,
            max_consecutive_failures: 5,
            save_interval: 5,
        }
    }
}

impl ExtractionConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }
}

/// Phone and website validation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// ISO 3166 region used when a phone number has no country prefix
    #[serde(rename = "default-region")]
    pub default_region: String,

    /// Timeout for the website reachability probe (seconds)
    #[serde(rename = "website-timeout-secs")]
    pub website_timeout_secs: u64,

    /// When false, websites are never probed and count as invalid
    #[serde(rename = "check-websites")]
    pub check_websites: bool,

    /// User agent sent with website probes
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            default_region: "US".to_string(),
            website_timeout_secs: 5,
            check_websites: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ValidationConfig {
    pub fn website_timeout(&self) -> Duration {
        Duration::from_secs(self.website_timeout_secs)
    }
}

/// Lead scoring weights and thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    #[serde(rename = "base-score")]
    pub base_score: i32,

    #[serde(rename = "no-website-bonus")]
    pub no_website_bonus: i32,

    #[serde(rename = "invalid-website-bonus")]
    pub invalid_website_bonus: i32,

    #[serde(rename = "high-rating-threshold")]
    pub high_rating_threshold: f32,

    #[serde(rename = "high-rating-bonus")]
    pub high_rating_bonus: i32,

    #[serde(rename = "low-rating-threshold")]
    pub low_rating_threshold: f32,

    #[serde(rename = "low-rating-bonus")]
    pub low_rating_bonus: i32,

    #[serde(rename = "high-reviews-threshold")]
    pub high_reviews_threshold: u32,

    #[serde(rename = "high-reviews-bonus")]
    pub high_reviews_bonus: i32,

    #[serde(rename = "low-reviews-threshold")]
    pub low_reviews_threshold: u32,

    #[serde(rename = "low-reviews-bonus")]
    pub low_reviews_bonus: i32,

    #[serde(rename = "max-score")]
    pub max_score: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: 50,
            no_website_bonus: 20,
            invalid_website_bonus: 15,
            high_rating_threshold: 4.5,
            high_rating_bonus: 10,
            low_rating_threshold: 3.5,
            low_rating_bonus: 5,
            high_reviews_threshold: 100,
            high_reviews_bonus: 5,
            low_reviews_threshold: 10,
            low_reviews_bonus: 10,
            max_score: 100,
        }
    }
}

/// Session state storage location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding `state_<key>.json` files and the `backups/` folder
    pub directory: String,

    /// Backups kept per session key; older ones are pruned after each save
    #[serde(rename = "max-backups")]
    pub max_backups: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            directory: ".scraping_state".to_string(),
            max_backups: 10,
        }
    }
}

/// Settings for the HTTP rendering collaborator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Search page URL template; `{query}` is required, `{page}` enables pagination
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// CSS selector matching one listing link on the results page
    #[serde(rename = "listing-selector")]
    pub listing_selector: String,

    /// Only listing links whose URL contains this fragment are kept
    #[serde(rename = "listing-url-contains")]
    pub listing_url_contains: Option<String>,

    /// Detail-view selectors, one per extracted field
    pub selectors: FieldSelectors,

    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.google.com/maps/search/{query}".to_string(),
            listing_selector: "a.hfpxzc".to_string(),
            listing_url_contains: Some("/maps/place/".to_string()),
            selectors: FieldSelectors::default(),
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headless: true,
        }
    }
}

impl BrowserConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// CSS selectors for the fields of one listing's detail view
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldSelectors {
    pub name: String,
    pub category: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub rating: String,
    pub reviews: String,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            name: "h1.DUwDvf".to_string(),
            category: r#"button[jsaction*="category"]"#.to_string(),
            address: r#"button[aria-label^="Address:"]"#.to_string(),
            phone: r#"button[aria-label^="Phone:"]"#.to_string(),
            website: r#"a[aria-label^="Website:"]"#.to_string(),
            rating: r#"span[aria-label*="stars"]"#.to_string(),
            reviews: r#"button[jsaction*="moreReviews"]"#.to_string(),
        }
    }
}

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
