//! Resumable scraping pipeline
//!
//! This module contains the core job logic, including:
//! - Listing enumeration over an infinite-scroll result list
//! - Per-field isolated extraction of one detail view
//! - The orchestrator that ties enumeration, extraction, validation,
//!   output and session state together

mod enumerator;
mod extractor;
mod orchestrator;

pub use enumerator::{enumerate, Enumeration};
pub use extractor::{clean_text, extract, parse_rating, parse_review_count, unwrap_redirect};
pub use orchestrator::{default_output_path, JobPhase, Orchestrator, RunOutcome, RunReport};

use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Picks a random delay in `min_ms..=max_ms`
pub(crate) fn jittered_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}

/// Sleeps for `delay` unless cancelled first
///
/// Returns false when the token fired.
pub(crate) async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel.cancelled() => false,
    }
}
