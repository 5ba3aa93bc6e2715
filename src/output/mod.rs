//! Output module for scraped leads and terminal reports
//!
//! This module handles:
//! - Writing lead records to CSV incrementally, with resume support
//! - Ordering a finished file by lead score
//! - Printing resumable sessions and run summaries

mod csv_output;
mod report;

pub use csv_output::{existing_keys, sort_by_score, IncrementalWriter};
pub use report::{print_run_summary, print_sessions};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(
        "Cannot append to {}: header is '{found}', expected the lead columns",
        .path.display()
    )]
    SchemaMismatch { path: PathBuf, found: String },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
