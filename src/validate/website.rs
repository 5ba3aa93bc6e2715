//! Website reachability probe
//!
//! The probe is the only I/O in validation. Every failure mode (bad URL,
//! connection error, timeout, 4xx/5xx) is folded into `false`.

use crate::config::ValidationConfig;
use reqwest::{redirect::Policy, Client, StatusCode};
use url::Url;

/// Builds the client used for website probes
///
/// Redirects are followed (up to 10 hops) and the whole request is bounded by
/// the configured timeout.
pub fn build_probe_client(config: &ValidationConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.website_timeout())
        .connect_timeout(config.website_timeout())
        .redirect(Policy::limited(10))
        .build()
}

/// Turns listing website text into a probe URL
///
/// Adds `https://` when no scheme is present. Returns None for text that is
/// not an http(s) URL with a host.
pub fn normalize_website(website: &str) -> Option<Url> {
    let trimmed = website.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).ok()?;
    match (url.scheme(), url.host_str()) {
        ("http" | "https", Some(_)) => Some(url),
        _ => None,
    }
}

/// Checks whether a website answers with a non-error status
///
/// Sends HEAD first; servers that refuse HEAD (405/501) get a GET.
pub async fn check_website(client: &Client, website: &str) -> bool {
    let Some(url) = normalize_website(website) else {
        tracing::debug!("Website '{}' is not a usable URL", website);
        return false;
    };

    let status = match client.head(url.clone()).send().await {
        Ok(response) => response.status(),
        Err(e) => {
            tracing::debug!("Website probe failed for {}: {}", url, e);
            return false;
        }
    };

    let status = if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED
    {
        match client.get(url.clone()).send().await {
            Ok(response) => response.status(),
            Err(e) => {
                tracing::debug!("Website GET fallback failed for {}: {}", url, e);
                return false;
            }
        }
    } else {
        status
    };

    tracing::trace!("Website {} answered {}", url, status);
    status.as_u16() < 400
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> Client {
        let config = ValidationConfig {
            website_timeout_secs: 1,
            ..ValidationConfig::default()
        };
        build_probe_client(&config).unwrap()
    }

    #[test]
    fn test_normalize_adds_scheme() {
        let url = normalize_website("bluedoor.example").unwrap();
        assert_eq!(url.as_str(), "https://bluedoor.example/");
    }

    #[test]
    fn test_normalize_keeps_http() {
        let url = normalize_website(" http://bluedoor.example/menu ").unwrap();
        assert_eq!(url.as_str(), "http://bluedoor.example/menu");
    }

    #[test]
    fn test_normalize_rejects_junk() {
        assert!(normalize_website("").is_none());
        assert!(normalize_website("   ").is_none());
        assert!(normalize_website("https://").is_none());
    }

    #[tokio::test]
    async fn test_reachable_site_is_valid() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(check_website(&test_client(), &server.uri()).await);
    }

    #[tokio::test]
    async fn test_error_status_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(!check_website(&test_client(), &server.uri()).await);
    }

    #[tokio::test]
    async fn test_head_not_allowed_falls_back_to_get() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        assert!(check_website(&test_client(), &server.uri()).await);
    }

    #[tokio::test]
    async fn test_redirect_is_followed() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/new", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(check_website(&test_client(), &format!("{}/old", server.uri())).await);
    }

    #[tokio::test]
    async fn test_timeout_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        assert!(!check_website(&test_client(), &server.uri()).await);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_invalid() {
        // Port 9 (discard) is closed on test machines.
        assert!(!check_website(&test_client(), "http://127.0.0.1:9/").await);
    }
}
