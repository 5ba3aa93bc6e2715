//! Full runs against a mock map-search site over HTTP

mod common;

use common::{read_rows, test_config};
use leadscout::browser::HttpBrowser;
use leadscout::{Orchestrator, RunOutcome};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn results_page(base: &str, ids: &[&str]) -> String {
    let links: String = ids
        .iter()
        .map(|id| format!(r#"<a class="hfpxzc" href="{}/maps/place/{}">{}</a>"#, base, id, id))
        .collect();
    format!(r#"<html><body><div role="feed">{}</div></body></html>"#, links)
}

async fn mount_page(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_scrape_mock_site_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/maps/search/cafe",
        results_page(&base, &["blue-door", "red-door", "blue-door"]),
    )
    .await;
    mount_page(
        &server,
        "/maps/place/blue-door",
        format!(
            r#"<html><body>
              <h1 class="DUwDvf">Blue Door Cafe</h1>
              <button jsaction="pane.category">Coffee shop</button>
              <button aria-label="Phone: (206) 555-0123">(206) 555-0123</button>
              <a aria-label="Website: bluedoor" href="{}/site/blue-door">site</a>
              <span aria-label="4.7 stars">4.7</span>
              <button jsaction="pane.moreReviews">(12)</button>
            </body></html>"#,
            base
        ),
    )
    .await;
    mount_page(
        &server,
        "/maps/place/red-door",
        r#"<html><body>
              <h1 class="DUwDvf">Red Door Diner</h1>
              <button aria-label="Address: 4 Main St, Seattle, WA">4 Main St</button>
            </body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/site/blue-door"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let output = temp.path().join("leads.csv");
    let mut config = test_config(&temp.path().join("state"));
    config.browser.search_url = format!("{}/maps/search/{{query}}", base);
    config.validation.check_websites = true;

    let browser = HttpBrowser::new(config.browser.clone()).unwrap();
    let mut orchestrator = Orchestrator::new(config, browser, CancellationToken::new()).unwrap();
    let report = orchestrator
        .run("cafe", 10, Some(output.clone()), true)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.total_candidates, 2);
    assert_eq!(report.success_count, 2);

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 2);

    // no website: 50 + 20
    assert_eq!(rows[0][0], "Red Door Diner");
    assert_eq!(rows[0][2], "4 Main St, Seattle, WA");
    assert_eq!(rows[0][5], "N/A");
    assert_eq!(rows[0][9], "70");

    // live website, high rating: 50 + 10
    assert_eq!(rows[1][0], "Blue Door Cafe");
    assert_eq!(rows[1][3], "+12065550123");
    assert_eq!(rows[1][6], "True");
    assert_eq!(rows[1][8], "12");
    assert_eq!(rows[1][9], "60");
}

#[tokio::test]
async fn test_search_page_error_is_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let output = temp.path().join("leads.csv");
    let mut config = test_config(&temp.path().join("state"));
    config.browser.search_url = format!("{}/maps/search/{{query}}", server.uri());

    let browser = HttpBrowser::new(config.browser.clone()).unwrap();
    let mut orchestrator = Orchestrator::new(config, browser, CancellationToken::new()).unwrap();
    let report = orchestrator
        .run("cafe", 10, Some(output.clone()), true)
        .await
        .unwrap();

    match report.outcome {
        RunOutcome::NoResults { diagnostic } => assert!(diagnostic.contains("503")),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(!output.exists());
}
