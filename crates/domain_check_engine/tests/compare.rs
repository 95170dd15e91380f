mod common;

use std::time::{Duration, Instant};

use common::{http_status, page, timeout, ScriptedFetcher};
use domain_check_engine::{compare_pair, FetchSettings, ReqwestFetcher, Verdict};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIMIT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn missing_url_short_circuits_without_fetching() {
    let fetcher = ScriptedFetcher::new();

    let verdict = compare_pair(&fetcher, "", "http://beta.com", LIMIT).await;
    assert_eq!(verdict, Verdict::MissingUrl);
    assert_eq!(verdict.note(), "FetchErr:MissingURL");
    assert!(!verdict.passed());

    let verdict = compare_pair(&fetcher, "acme.com", "   ", LIMIT).await;
    assert_eq!(verdict, Verdict::MissingUrl);
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn same_host_passes_regardless_of_content() {
    let fetcher = ScriptedFetcher::new()
        .script("http://acme.com", vec![page("<p>one</p>")])
        .script("http://www.acme.com", vec![page("<p>two</p>")]);

    let verdict = compare_pair(&fetcher, "acme.com", "http://www.acme.com", LIMIT).await;
    assert_eq!(verdict, Verdict::Pass);
    // Both sides are still fetched on a host match.
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn host_match_does_not_hide_fetch_failures() {
    let fetcher = ScriptedFetcher::new()
        .script("http://acme.com", vec![page("<p>one</p>")])
        .script("http://www.acme.com", vec![timeout()]);

    let verdict = compare_pair(&fetcher, "acme.com", "www.acme.com", LIMIT).await;
    assert_eq!(verdict.note(), "FetchErr:200|Timeout");
    assert!(!verdict.passed());
}

#[tokio::test]
async fn content_decides_between_different_hosts() {
    let fetcher = ScriptedFetcher::new()
        .script("http://a.com", vec![page("same")])
        .script("http://b.com", vec![page("same")])
        .script("http://c.com", vec![page("other")])
        .script("http://empty.com", vec![page("")]);

    assert_eq!(compare_pair(&fetcher, "a.com", "b.com", LIMIT).await, Verdict::Pass);
    assert_eq!(compare_pair(&fetcher, "a.com", "c.com", LIMIT).await, Verdict::StillDiff);
    assert_eq!(compare_pair(&fetcher, "empty.com", "c.com", LIMIT).await, Verdict::EmptyBody);
}

#[tokio::test]
async fn both_failures_are_reported_in_note() {
    let fetcher = ScriptedFetcher::new()
        .script("http://gone.com", vec![http_status(410)])
        .script("http://slow.com", vec![timeout()]);

    let verdict = compare_pair(&fetcher, "gone.com", "slow.com", LIMIT).await;
    assert_eq!(verdict.note(), "FetchErr:410|Timeout");
}

#[tokio::test]
async fn both_sides_are_fetched_concurrently() {
    let fetcher = ScriptedFetcher::new().with_delay(Duration::from_millis(300));

    let started = Instant::now();
    let verdict = compare_pair(&fetcher, "a.com", "b.com", LIMIT).await;
    let elapsed = started.elapsed();

    assert_eq!(verdict, Verdict::Pass);
    assert!(elapsed < Duration::from_millis(550), "took {elapsed:?}");
}

#[tokio::test]
async fn end_to_end_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>acme</html>", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>acme</html>", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).expect("client builds");
    let home = format!("{}/home", server.uri());
    let landing = format!("{}/landing", server.uri());
    let down = format!("{}/down", server.uri());

    assert_eq!(compare_pair(&fetcher, &home, &landing, LIMIT).await, Verdict::Pass);
    assert_eq!(
        compare_pair(&fetcher, &home, &down, LIMIT).await.note(),
        "FetchErr:200|503"
    );
}
