//! HTML parsing for the HTTP collaborator
//!
//! This module handles:
//! - Extracting listing links from a results page
//! - Reading detail-view fields through configured CSS selectors

use crate::browser::traits::{BrowserError, BrowserResult, ItemView};
use crate::config::FieldSelectors;
use crate::model::FieldKind;
use scraper::{Html, Selector};
use url::Url;

/// Extracts listing links from a results page
///
/// Links are resolved against `base_url`, filtered by `must_contain` when
/// given, and returned in document order. Repeated links are kept; the
/// enumerator deduplicates.
///
/// # Example
///
/// ```
/// use leadscout::browser::extract_listing_links;
/// use url::Url;
///
/// let html = r#"<div role="feed"><a class="hfpxzc" href="/maps/place/a">A</a></div>"#;
/// let base = Url::parse("https://maps.example.com/search?q=cafe").unwrap();
/// let links = extract_listing_links(html, &base, "a.hfpxzc", None).unwrap();
/// assert_eq!(links, vec!["https://maps.example.com/maps/place/a".to_string()]);
/// ```
pub fn extract_listing_links(
    html: &str,
    base_url: &Url,
    selector: &str,
    must_contain: Option<&str>,
) -> Result<Vec<String>, String> {
    let selector = Selector::parse(selector)
        .map_err(|e| format!("invalid listing selector '{}': {:?}", selector, e))?;
    let document = Html::parse_document(html);

    let links = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .filter(|link| must_contain.map_or(true, |fragment| link.contains(fragment)))
        .collect();

    Ok(links)
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for empty hrefs, special schemes and unparsable links.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}

/// A detail page fetched over HTTP
///
/// The body is kept as text and parsed per read, so a broken selector or odd
/// markup for one field cannot affect another.
pub struct HtmlItemView {
    body: String,
    selectors: FieldSelectors,
}

impl HtmlItemView {
    pub fn new(body: String, selectors: FieldSelectors) -> Self {
        Self { body, selectors }
    }

    fn selector_for(&self, field: FieldKind) -> &str {
        match field {
            FieldKind::Name => &self.selectors.name,
            FieldKind::Category => &self.selectors.category,
            FieldKind::Address => &self.selectors.address,
            FieldKind::Phone => &self.selectors.phone,
            FieldKind::Website => &self.selectors.website,
            FieldKind::Rating => &self.selectors.rating,
            FieldKind::Reviews => &self.selectors.reviews,
        }
    }
}

impl ItemView for HtmlItemView {
    fn read(&self, field: FieldKind) -> BrowserResult<Option<String>> {
        let css = self.selector_for(field);
        let selector = Selector::parse(css).map_err(|e| BrowserError::Element {
            field,
            message: format!("invalid selector '{}': {:?}", css, e),
        })?;

        let document = Html::parse_document(&self.body);
        let Some(element) = document.select(&selector).next() else {
            return Ok(None);
        };

        // Map listings carry the useful value in aria-label ("Phone: ...") and
        // websites in href; visible text is the fallback.
        let node = element.value();
        let attribute = match field {
            FieldKind::Website => node.attr("href").or_else(|| node.attr("aria-label")),
            FieldKind::Name | FieldKind::Category => None,
            _ => node.attr("aria-label"),
        };
        let raw = match attribute {
            Some(value) => value.to_string(),
            None => element.text().collect::<String>(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = r#"
        <html><body>
          <h1 class="DUwDvf">  Blue Door Cafe </h1>
          <button jsaction="pane.category">Coffee shop</button>
          <button aria-label="Address: 12 Pike St, Seattle, WA">12 Pike St</button>
          <button aria-label="Phone: (206) 555-0123">(206) 555-0123</button>
          <a aria-label="Website: bluedoor.example" href="https://bluedoor.example/">bluedoor.example</a>
          <span role="img" aria-label="4.6 stars">4.6</span>
          <button jsaction="pane.reviewChart.moreReviews"><span>(1,234)</span></button>
        </body></html>
    "#;

    fn view(body: &str) -> HtmlItemView {
        HtmlItemView::new(body.to_string(), FieldSelectors::default())
    }

    #[test]
    fn test_extract_listing_links_filters_and_resolves() {
        let html = r#"
            <a class="hfpxzc" href="/maps/place/one">One</a>
            <a class="hfpxzc" href="https://maps.example.com/maps/place/two">Two</a>
            <a class="hfpxzc" href="/maps/search/other">Other</a>
            <a class="hfpxzc" href="javascript:void(0)">Script</a>
            <a class="other" href="/maps/place/three">Three</a>
        "#;
        let base = Url::parse("https://maps.example.com/search?q=cafe").unwrap();
        let links = extract_listing_links(html, &base, "a.hfpxzc", Some("/maps/place/")).unwrap();

        assert_eq!(
            links,
            vec![
                "https://maps.example.com/maps/place/one".to_string(),
                "https://maps.example.com/maps/place/two".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_listing_links_invalid_selector() {
        let base = Url::parse("https://maps.example.com/").unwrap();
        assert!(extract_listing_links("<html></html>", &base, "a[[[", None).is_err());
    }

    #[test]
    fn test_resolve_link_skips_special_schemes() {
        let base = Url::parse("https://maps.example.com/").unwrap();
        assert_eq!(resolve_link("mailto:a@b.c", &base), None);
        assert_eq!(resolve_link("tel:123", &base), None);
        assert_eq!(resolve_link("#top", &base), None);
        assert_eq!(resolve_link("  ", &base), None);
    }

    #[test]
    fn test_read_fields_from_detail_page() {
        let view = view(DETAIL_PAGE);
        assert_eq!(
            view.read(FieldKind::Name).unwrap(),
            Some("Blue Door Cafe".to_string())
        );
        assert_eq!(
            view.read(FieldKind::Category).unwrap(),
            Some("Coffee shop".to_string())
        );
        assert_eq!(
            view.read(FieldKind::Address).unwrap(),
            Some("Address: 12 Pike St, Seattle, WA".to_string())
        );
        assert_eq!(
            view.read(FieldKind::Phone).unwrap(),
            Some("Phone: (206) 555-0123".to_string())
        );
        assert_eq!(
            view.read(FieldKind::Website).unwrap(),
            Some("https://bluedoor.example/".to_string())
        );
        assert_eq!(
            view.read(FieldKind::Rating).unwrap(),
            Some("4.6 stars".to_string())
        );
        assert_eq!(
            view.read(FieldKind::Reviews).unwrap(),
            Some("(1,234)".to_string())
        );
    }

    #[test]
    fn test_missing_element_reads_as_none() {
        let view = view("<html><body><h1 class=\"DUwDvf\">Only a name</h1></body></html>");
        assert_eq!(view.read(FieldKind::Phone).unwrap(), None);
        assert_eq!(view.read(FieldKind::Website).unwrap(), None);
    }

    #[test]
    fn test_bad_selector_fails_only_that_field() {
        let mut selectors = FieldSelectors::default();
        selectors.phone = "button[[[".to_string();
        let view = HtmlItemView::new(DETAIL_PAGE.to_string(), selectors);

        assert!(matches!(
            view.read(FieldKind::Phone),
            Err(BrowserError::Element { field: FieldKind::Phone, .. })
        ));
        assert!(view.read(FieldKind::Name).unwrap().is_some());
    }
}
