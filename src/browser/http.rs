//! HTTP rendering collaborator
//!
//! `HttpBrowser` implements the `Browser` contract for map-search front-ends
//! that serve server-rendered HTML:
//! - opening a search fetches the first results page
//! - "scrolling" fetches the next results page when the search URL has a
//!   `{page}` placeholder, and is a no-op otherwise
//! - rendering a listing fetches its detail page

use crate::browser::parser::{extract_listing_links, HtmlItemView};
use crate::browser::traits::{Browser, BrowserError, BrowserResult, ItemView};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashSet;
use url::Url;

/// Builds an HTTP client with the configured user agent and timeouts
pub fn build_http_client(config: &BrowserConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches search results and listing pages over plain HTTP
pub struct HttpBrowser {
    client: Client,
    config: BrowserConfig,
    query: Option<String>,
    next_page: u32,
    identifiers: Vec<String>,
    seen: HashSet<String>,
}

impl HttpBrowser {
    pub fn new(config: BrowserConfig) -> Result<Self, BrowserError> {
        if !config.headless {
            tracing::warn!("HTTP renderer has no visible mode; running headless");
        }
        let client = build_http_client(&config)?;
        Ok(Self {
            client,
            config,
            query: None,
            next_page: 1,
            identifiers: Vec::new(),
            seen: HashSet::new(),
        })
    }

    fn paginated(&self) -> bool {
        self.config.search_url.contains("{page}")
    }

    /// Builds the search URL for a query and page number
    pub fn search_url(&self, query: &str, page: u32) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        self.config
            .search_url
            .replace("{query}", &encoded)
            .replace("{page}", &page.to_string())
    }

    /// Fetches a page and returns its final URL and body
    ///
    /// Any non-2xx status is reported as `HttpStatus`.
    async fn fetch_page(&self, url: &str) -> BrowserResult<(Url, String)> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                BrowserError::Timeout(self.config.request_timeout())
            } else {
                BrowserError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrowserError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok((final_url, body))
    }

    /// Fetches one results page and records the listings not seen before
    async fn load_results_page(&mut self, page: u32) -> BrowserResult<usize> {
        let query = self.query.clone().ok_or(BrowserError::NoSearch)?;
        let url = self.search_url(&query, page);
        tracing::debug!("Fetching results page {}: {}", page, url);

        let (final_url, body) = self.fetch_page(&url).await?;
        let links = extract_listing_links(
            &body,
            &final_url,
            &self.config.listing_selector,
            self.config.listing_url_contains.as_deref(),
        )
        .map_err(|message| BrowserError::Navigation {
            url: url.clone(),
            message,
        })?;

        let mut added = 0;
        for link in links {
            if self.seen.insert(link.clone()) {
                self.identifiers.push(link);
                added += 1;
            }
        }

        Ok(added)
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn open_search(&mut self, query: &str) -> BrowserResult<()> {
        self.query = Some(query.to_string());
        self.identifiers.clear();
        self.seen.clear();
        self.next_page = 1;

        let added = self.load_results_page(self.next_page).await?;
        self.next_page += 1;
        tracing::info!("Search opened with {} listings on the first page", added);
        Ok(())
    }

    async fn scroll_and_count(&mut self) -> BrowserResult<usize> {
        if self.query.is_none() {
            return Err(BrowserError::NoSearch);
        }

        if self.paginated() {
            let page = self.next_page;
            self.next_page += 1;
            self.load_results_page(page).await?;
        }

        Ok(self.identifiers.len())
    }

    async fn visible_identifiers(&mut self) -> BrowserResult<Vec<String>> {
        if self.query.is_none() {
            return Err(BrowserError::NoSearch);
        }
        Ok(self.identifiers.clone())
    }

    async fn render(&mut self, identifier: &str) -> BrowserResult<Box<dyn ItemView>> {
        let (_, body) = self.fetch_page(identifier).await?;
        Ok(Box::new(HtmlItemView::new(
            body,
            self.config.selectors.clone(),
        )))
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.query = None;
        self.identifiers.clear();
        self.seen.clear();
        Ok(())
    }
}
