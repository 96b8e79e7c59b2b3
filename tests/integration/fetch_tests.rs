//! Integration tests for the fetcher and politeness gate
//!
//! These tests use wiremock servers as remote origins and check retry,
//! redirect and robots.txt behavior end-to-end.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use toytoons_scraper::config::CrawlerConfig;
use toytoons_scraper::crawler::{build_http_client, FetchError, Fetcher, PolitenessGate};
use toytoons_scraper::storage::{self, SharedStorage, SqliteStorage, Storage};
use toytoons_scraper::url::document_key;
use toytoons_scraper::ErrorKind;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast settings: no politeness delay and a tiny backoff schedule
fn test_config() -> CrawlerConfig {
    CrawlerConfig {
        delay_min: 0.0,
        delay_max: 0.0,
        request_timeout_seconds: 5,
        max_retries: 3,
        max_redirects: 5,
        backoff_base_seconds: 0.01,
        backoff_jitter: 0.0,
        backoff_max_seconds: 0.5,
        user_agent: "TestBot/1.0".to_string(),
        ..CrawlerConfig::default()
    }
}

fn fetcher(config: &CrawlerConfig) -> (Fetcher, SharedStorage) {
    let storage: SharedStorage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let client = build_http_client(config).unwrap();
    let gate = Arc::new(PolitenessGate::new(client.clone(), config));
    (Fetcher::new(client, gate, config, storage.clone()), storage)
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_fetch_stores_document() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/shows/jem"))
        .respond_with(html("<title>Jem</title>"))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, storage) = fetcher(&test_config());
    let url = format!("{}/shows/jem#cast", server.uri());
    let doc = fetcher.fetch(&url).await.unwrap();

    assert_eq!(doc.url, format!("{}/shows/jem", server.uri()));
    assert_eq!(doc.http_status, 200);
    assert!(doc.robots_allowed);
    assert_eq!(doc.content_type.as_deref(), Some("text/html; charset=utf-8"));

    let stored = storage::lock(&storage)
        .get_raw_document(&document_key(&doc.url))
        .unwrap()
        .unwrap();
    assert_eq!(stored.content_bytes, b"<title>Jem</title>".to_vec());
}

#[tokio::test]
async fn test_robots_disallow_makes_no_request() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private").await;
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let (fetcher, storage) = fetcher(&test_config());
    let err = fetcher
        .fetch(&format!("{}/private/page", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::RobotsDisallowed { .. }));
    assert_eq!(err.kind(), ErrorKind::RobotsDisallowed);
    assert_eq!(storage::lock(&storage).count_raw_documents().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, _) = fetcher(&test_config());
    assert!(fetcher.fetch(&format!("{}/page", server.uri())).await.is_ok());
}

#[tokio::test]
async fn test_server_error_retries_then_fails_transient() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let (fetcher, storage) = fetcher(&test_config());
    let err = fetcher.fetch(&format!("{}/broken", server.uri())).await.unwrap_err();

    match err {
        FetchError::NetworkTransient { attempts, .. } => assert_eq!(attempts, 4),
        other => panic!("expected NetworkTransient, got {:?}", other),
    }
    assert_eq!(storage::lock(&storage).count_raw_documents().unwrap(), 0);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, _) = fetcher(&test_config());
    let err = fetcher.fetch(&format!("{}/gone", server.uri())).await.unwrap_err();

    assert!(matches!(err, FetchError::NetworkPermanent { status: Some(404), .. }));
    assert_eq!(err.kind(), ErrorKind::NetworkPermanent);
}

#[tokio::test]
async fn test_too_many_requests_honors_retry_after() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(html("finally"))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, _) = fetcher(&test_config());
    let doc = fetcher.fetch(&format!("{}/busy", server.uri())).await.unwrap();
    assert_eq!(doc.content_bytes, b"finally".to_vec());
}

#[tokio::test]
async fn test_follows_relative_redirect() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("moved"))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, _) = fetcher(&test_config());
    let doc = fetcher.fetch(&format!("{}/old", server.uri())).await.unwrap();

    assert_eq!(doc.url, format!("{}/old", server.uri()));
    assert_eq!(doc.final_url, format!("{}/new", server.uri()));
}

#[tokio::test]
async fn test_redirect_into_disallowed_path_stops() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private").await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/private/x"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/x"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let (fetcher, _) = fetcher(&test_config());
    let err = fetcher.fetch(&format!("{}/public", server.uri())).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RobotsDisallowed);
}

#[tokio::test]
async fn test_redirect_loop_is_terminal() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
        .expect(3)
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        max_redirects: 2,
        ..test_config()
    };
    let (fetcher, _) = fetcher(&config);
    let err = fetcher.fetch(&format!("{}/loop", server.uri())).await.unwrap_err();

    assert!(matches!(err, FetchError::TooManyRedirects { hops: 2, .. }));
    assert_eq!(err.kind(), ErrorKind::TooManyRedirects);
}

#[tokio::test]
async fn test_redirect_without_location_is_permanent() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/nowhere"))
        .respond_with(ResponseTemplate::new(302))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, _) = fetcher(&test_config());
    let err = fetcher.fetch(&format!("{}/nowhere", server.uri())).await.unwrap_err();
    assert!(matches!(err, FetchError::NetworkPermanent { status: Some(302), .. }));
}

#[tokio::test]
async fn test_same_origin_requests_are_spaced() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .respond_with(html("page"))
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        delay_min: 0.2,
        delay_max: 0.3,
        ..test_config()
    };
    let (fetcher, _) = fetcher(&config);

    let url_a = format!("{}/a", server.uri());
    let url_b = format!("{}/b", server.uri());
    let url_c = format!("{}/c", server.uri());
    let start = Instant::now();
    let (a, b, c) = tokio::join!(
        fetcher.fetch(&url_a),
        fetcher.fetch(&url_b),
        fetcher.fetch(&url_c),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    // robots.txt plus three pages: four releases need three full intervals
    assert!(start.elapsed() >= Duration::from_millis(600));

    let origin = toytoons_scraper::Origin::of(&url::Url::parse(&server.uri()).unwrap()).unwrap();
    assert_eq!(fetcher.gate().requests_released(&origin).await, 4);
}

#[tokio::test]
async fn test_robots_request_is_spaced_from_first_page() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("page"))
        .expect(1)
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        delay_min: 0.3,
        delay_max: 0.3,
        ..test_config()
    };
    let (fetcher, _) = fetcher(&config);

    let start = Instant::now();
    fetcher.fetch(&format!("{}/page", server.uri())).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(300));

    let origin = toytoons_scraper::Origin::of(&url::Url::parse(&server.uri()).unwrap()).unwrap();
    assert_eq!(fetcher.gate().requests_released(&origin).await, 2);
}

#[tokio::test]
async fn test_redirected_robots_is_honored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/real-robots.txt"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/real-robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let (fetcher, _) = fetcher(&test_config());
    let err = fetcher.fetch(&format!("{}/page", server.uri())).await.unwrap_err();
    assert!(matches!(err, FetchError::RobotsDisallowed { .. }));
}

#[tokio::test]
async fn test_robots_redirect_loop_is_unavailable() {
    let server = MockServer::start().await;
    // One request plus five followed hops, then the chain is abandoned
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/robots.txt"))
        .expect(6)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("page"))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, _) = fetcher(&test_config());
    assert!(fetcher.fetch(&format!("{}/page", server.uri())).await.is_ok());
}

#[tokio::test]
async fn test_robots_fetched_once_per_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(html("page"))
        .mount(&server)
        .await;

    let (fetcher, _) = fetcher(&test_config());
    for page in ["a", "b", "c"] {
        fetcher.fetch(&format!("{}/{}", server.uri(), page)).await.unwrap();
    }
}
