//! Listing enumeration over a growing result list

use super::{jittered_delay, pause};
use crate::browser::{Browser, BrowserResult};
use crate::config::EnumerationConfig;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Result of one enumeration pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    /// Unique identifiers in discovery order, at most the target count
    pub identifiers: Vec<String>,

    /// Scroll rounds performed
    pub rounds: u32,

    /// True when the source stopped yielding new identifiers
    pub exhausted: bool,

    /// True when the cancellation token fired before enumeration finished
    pub interrupted: bool,
}

/// Collects up to `target` unique listing identifiers from an open result list
///
/// Each round asks the collaborator to reveal more items, then reads the
/// visible identifiers and keeps the ones not seen before. Enumeration stops
/// when:
/// - `target` identifiers are collected
/// - `no-change-limit` consecutive rounds add nothing (source exhausted)
/// - `max-rounds` rounds have run
/// - `cancel` fires
///
/// A round that errors or exceeds `scroll-timeout-ms` counts as a round with
/// no new identifiers; it never aborts enumeration.
///
/// # Arguments
///
/// * `browser` - Collaborator with the search results already open
/// * `target` - Maximum number of identifiers to collect
/// * `config` - Round limits and pacing
/// * `cancel` - Checked before every round and during the pause after it
pub async fn enumerate<B>(
    browser: &mut B,
    target: usize,
    config: &EnumerationConfig,
    cancel: &CancellationToken,
) -> Enumeration
where
    B: Browser + ?Sized,
{
    let mut result = Enumeration::default();
    let mut seen = HashSet::new();

    if target == 0 {
        return result;
    }

    // Items rendered before the first scroll
    match tokio::time::timeout(config.scroll_timeout(), browser.visible_identifiers()).await {
        Ok(Ok(ids)) => {
            absorb(&mut result.identifiers, &mut seen, ids, target);
        }
        Ok(Err(e)) => tracing::warn!("Could not read initial listings: {}", e),
        Err(_) => tracing::warn!("Reading initial listings timed out"),
    }

    let mut unchanged_rounds = 0;

    while result.identifiers.len() < target {
        if cancel.is_cancelled() {
            result.interrupted = true;
            break;
        }

        if result.rounds >= config.max_rounds {
            tracing::warn!(
                "Stopping enumeration after {} rounds with {} of {} listings",
                result.rounds,
                result.identifiers.len(),
                target
            );
            break;
        }
        result.rounds += 1;

        let added = match tokio::time::timeout(config.scroll_timeout(), scroll_round(browser)).await
        {
            Ok(Ok(ids)) => absorb(&mut result.identifiers, &mut seen, ids, target),
            Ok(Err(e)) => {
                tracing::warn!("Enumeration round {} failed: {}", result.rounds, e);
                0
            }
            Err(_) => {
                tracing::warn!(
                    "Enumeration round {} timed out after {:?}",
                    result.rounds,
                    config.scroll_timeout()
                );
                0
            }
        };

        if added == 0 {
            unchanged_rounds += 1;
            if unchanged_rounds >= config.no_change_limit {
                tracing::info!(
                    "No new listings for {} rounds, result list exhausted",
                    unchanged_rounds
                );
                result.exhausted = true;
                break;
            }
        } else {
            unchanged_rounds = 0;
            tracing::debug!(
                "Round {}: +{} listings ({} total)",
                result.rounds,
                added,
                result.identifiers.len()
            );
        }

        if result.identifiers.len() < target {
            let delay = jittered_delay(config.round_delay_min_ms, config.round_delay_max_ms);
            if !pause(delay, cancel).await {
                result.interrupted = true;
                break;
            }
        }
    }

    tracing::info!(
        "Enumerated {} listings in {} rounds",
        result.identifiers.len(),
        result.rounds
    );
    result
}

async fn scroll_round<B>(browser: &mut B) -> BrowserResult<Vec<String>>
where
    B: Browser + ?Sized,
{
    let visible = browser.scroll_and_count().await?;
    tracing::trace!("{} listings visible after scroll", visible);
    browser.visible_identifiers().await
}

/// Appends unseen identifiers up to `target`; returns how many were added
fn absorb(
    collected: &mut Vec<String>,
    seen: &mut HashSet<String>,
    ids: Vec<String>,
    target: usize,
) -> usize {
    let before = collected.len();
    for id in ids {
        if collected.len() >= target {
            break;
        }
        if seen.insert(id.clone()) {
            collected.push(id);
        }
    }
    collected.len() - before
}
