//! Shared fixtures for pipeline integration tests
//!
//! `ScriptedBrowser` stands in for a real rendering session: it reveals a
//! fixed list of listings a few at a time and renders each one from a map of
//! field values, or fails it on request.

#![allow(dead_code)]

use async_trait::async_trait;
use leadscout::browser::{Browser, BrowserError, BrowserResult, ItemView};
use leadscout::model::FieldKind;
use leadscout::Config;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// One listing the scripted browser can show
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: String,
    pub fields: HashMap<FieldKind, String>,
}

impl Listing {
    /// A listing with a name and category only
    pub fn named(id: usize, name: &str) -> Self {
        let mut fields = HashMap::new();
        fields.insert(FieldKind::Name, name.to_string());
        fields.insert(FieldKind::Category, "Coffee shop".to_string());
        Self {
            id: format!("https://maps.example/place/{}", id),
            fields,
        }
    }

    pub fn with(mut self, field: FieldKind, value: &str) -> Self {
        self.fields.insert(field, value.to_string());
        self
    }
}

/// `n` listings named "Business 0" .. "Business n-1"
pub fn listings(n: usize) -> Vec<Listing> {
    (0..n)
        .map(|i| Listing::named(i, &format!("Business {}", i)))
        .collect()
}

struct MapView(HashMap<FieldKind, String>);

impl ItemView for MapView {
    fn read(&self, field: FieldKind) -> BrowserResult<Option<String>> {
        Ok(self.0.get(&field).cloned())
    }
}

/// Observations shared with the test after the browser moves into the orchestrator
#[derive(Clone, Default)]
pub struct Probe {
    rendered: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl Probe {
    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// In-memory rendering collaborator
pub struct ScriptedBrowser {
    listings: Vec<Listing>,
    per_scroll: usize,
    shown: usize,
    failing: HashSet<usize>,
    fail_open: bool,
    cancel_after: Option<(usize, CancellationToken)>,
    probe: Probe,
}

impl ScriptedBrowser {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings,
            per_scroll: 3,
            shown: 0,
            failing: HashSet::new(),
            fail_open: false,
            cancel_after: None,
            probe: Probe::default(),
        }
    }

    /// Renders of these zero-based positions fail
    pub fn failing(mut self, positions: impl IntoIterator<Item = usize>) -> Self {
        self.failing.extend(positions);
        self
    }

    /// The search page never opens
    pub fn unreachable(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Fires `token` right after the `renders`-th render returns
    pub fn cancel_after(mut self, renders: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((renders, token));
        self
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn open_search(&mut self, _query: &str) -> BrowserResult<()> {
        if self.fail_open {
            return Err(BrowserError::Navigation {
                url: "https://maps.example/search".to_string(),
                message: "connection refused".to_string(),
            });
        }
        self.shown = self.per_scroll.min(self.listings.len());
        Ok(())
    }

    async fn scroll_and_count(&mut self) -> BrowserResult<usize> {
        self.shown = (self.shown + self.per_scroll).min(self.listings.len());
        Ok(self.shown)
    }

    async fn visible_identifiers(&mut self) -> BrowserResult<Vec<String>> {
        Ok(self.listings[..self.shown]
            .iter()
            .map(|l| l.id.clone())
            .collect())
    }

    async fn render(&mut self, identifier: &str) -> BrowserResult<Box<dyn ItemView>> {
        let rendered = {
            let mut rendered = self.probe.rendered.lock().unwrap();
            rendered.push(identifier.to_string());
            rendered.len()
        };

        if let Some((after, token)) = &self.cancel_after {
            if rendered >= *after {
                token.cancel();
            }
        }

        let position = self
            .listings
            .iter()
            .position(|l| l.id == identifier)
            .ok_or_else(|| BrowserError::Navigation {
                url: identifier.to_string(),
                message: "unknown listing".to_string(),
            })?;

        if self.failing.contains(&position) {
            return Err(BrowserError::Navigation {
                url: identifier.to_string(),
                message: "detail view did not load".to_string(),
            });
        }

        Ok(Box::new(MapView(self.listings[position].fields.clone())))
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.probe.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Fast, offline configuration rooted in `state_dir`
pub fn test_config(state_dir: &Path) -> Config {
    let mut config = Config::default();
    config.state.directory = state_dir.to_string_lossy().into_owned();
    config.enumeration.no_change_limit = 2;
    config.enumeration.round_delay_min_ms = 0;
    config.enumeration.round_delay_max_ms = 0;
    config.enumeration.scroll_timeout_ms = 2000;
    config.extraction.delay_min_ms = 0;
    config.extraction.delay_max_ms = 0;
    config.extraction.render_timeout_ms = 2000;
    config.validation.check_websites = false;
    config
}

/// Data rows of a CSV output, as raw field vectors
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

/// Names column of a CSV output
pub fn read_names(path: &Path) -> Vec<String> {
    read_rows(path).into_iter().map(|row| row[0].clone()).collect()
}
