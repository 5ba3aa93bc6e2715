//! Configuration module for Leadscout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All tunable policy (scroll limits, circuit breaker, save cadence, scoring
//! weights, selectors) lives here and is passed by value into each component.
//!
//! # Example
//!
//! ```no_run
//! use leadscout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("leadscout.toml")).unwrap();
//! println!("Circuit breaker: {}", config.extraction.max_consecutive_failures);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, EnumerationConfig, ExtractionConfig, FieldSelectors, ScoringConfig,
    StateConfig, ValidationConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
