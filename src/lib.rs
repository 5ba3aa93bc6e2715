//! Leadscout: a resumable business-listing scraper
//!
//! This crate enumerates listings from a map-search front-end, extracts each
//! listing's fields, validates and scores them as sales leads, and appends the
//! results to a CSV file. Progress is checkpointed to a per-query session file
//! so an interrupted run continues where it stopped without duplicating rows.

pub mod browser;
pub mod config;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod validate;

use thiserror::Error;

/// Main error type for Leadscout operations
///
/// Only run-level conditions end up here. Field and candidate failures are
/// absorbed by the pipeline and reported through counts instead.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session state error: {0}")]
    State(#[from] state::StateError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector for {field}: {selector}")]
    InvalidSelector { field: String, selector: String },
}

/// Result type alias for Leadscout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;


// Re-export commonly used types
pub use config::Config;
pub use model::{BusinessRecord, Field};
pub use pipeline::{Orchestrator, RunOutcome, RunReport};
pub use state::{SessionState, StateStore};
