//! Collaborator traits and error types
//!
//! The pipeline never talks to a page directly. It drives a `Browser`, which
//! owns navigation and scrolling, and reads fields through the `ItemView`
//! handle returned for one rendered listing.

use crate::model::FieldKind;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a rendering collaborator
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to read {field}: {message}")]
    Element { field: FieldKind, message: String },

    #[error("No search results page is open")]
    NoSearch,

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Result type for collaborator operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// The rendering collaborator consumed by the pipeline
///
/// Implementations are driven strictly sequentially by one job and are not
/// expected to tolerate concurrent calls. Callers bound every call with a
/// timeout.
#[async_trait]
pub trait Browser: Send {
    /// Opens the result list for a search query
    async fn open_search(&mut self, query: &str) -> BrowserResult<()>;

    /// Asks the result list to reveal more items and returns the visible count
    async fn scroll_and_count(&mut self) -> BrowserResult<usize>;

    /// Identifiers of the currently visible listings, in display order
    async fn visible_identifiers(&mut self) -> BrowserResult<Vec<String>>;

    /// Renders one listing's detail view
    async fn render(&mut self, identifier: &str) -> BrowserResult<Box<dyn ItemView>>;

    /// Releases the underlying session
    async fn close(&mut self) -> BrowserResult<()> {
        Ok(())
    }
}

/// Read access to one rendered listing
pub trait ItemView: Send {
    /// Reads the raw text of a field
    ///
    /// `Ok(None)` means the field is not shown on this listing; `Err` means the
    /// read itself failed.
    fn read(&self, field: FieldKind) -> BrowserResult<Option<String>>;
}
