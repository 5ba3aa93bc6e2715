//! Rendering collaborator layer
//!
//! This module contains:
//! - The `Browser` / `ItemView` traits the pipeline drives
//! - `HttpBrowser`, a collaborator for server-rendered result pages
//! - HTML helpers for reading listing links and detail fields

mod http;
mod parser;
mod traits;

pub use http::{build_http_client, HttpBrowser};
pub use parser::{extract_listing_links, HtmlItemView};
pub use traits::{Browser, BrowserError, BrowserResult, ItemView};
