//! Integration tests for the pipeline orchestrator
//!
//! Wiremock servers stand in for the remote sites and the model backend.
//! Each test drives whole runs and checks the ledger, the merged dataset
//! and the record log.

use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use toytoons_scraper::config::{Config, CrawlerConfig};
use toytoons_scraper::output::{export_all, JsonExporter};
use toytoons_scraper::storage::{self, open_shared, SharedStorage, SqliteStorage, Storage};
use toytoons_scraper::summarize::TextRank;
use toytoons_scraper::{ErrorKind, Orchestrator, PipelineStage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler = CrawlerConfig {
        delay_min: 0.0,
        delay_max: 0.0,
        concurrency: 4,
        request_timeout_seconds: 5,
        backoff_base_seconds: 0.01,
        backoff_jitter: 0.0,
        backoff_max_seconds: 0.5,
        ..CrawlerConfig::default()
    };
    config
}

fn memory_storage() -> SharedStorage {
    Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()))
}

fn page(title: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{}</p>", p)).collect();
    format!(
        "<html><head><title>{}</title></head><body><nav>Home</nav><div class=\"article-content\">{}</div></body></html>",
        title, body
    )
}

async fn serve(server: &MockServer, at: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .mount(&server)
        .await;

    serve(
        &server,
        "/silverhawks",
        page(
            "SilverHawks (TV series) - Retro Toons",
            &[
                "SilverHawks is an American animated television series produced by Rankin/Bass Productions. It aired from 1986 to 1987 in syndication.",
                "The show featured Quicksilver, Steelwill, Bluegrass and the villain Mon*Star.",
                "The Kenner toy line ran alongside the series and the figures were released in 1986.",
            ],
        ),
    )
    .await;

    for at in ["/transformers-g1", "/transformers-toys"] {
        serve(
            &server,
            at,
            page(
                "Transformers - Retro Toons",
                &[
                    "Transformers is an American animated series about robots in disguise. It aired from 1984 to 1987.",
                    "Hasbro sold the Transformers figures worldwide. Optimus Prime leads the Autobots against the Decepticons.",
                ],
            ),
        )
        .await;
    }

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    server
}

fn seeds(server: &MockServer, paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| format!("{}{}", server.uri(), p)).collect()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

#[tokio::test]
async fn test_full_run_produces_listings() {
    let server = site().await;
    let storage = memory_storage();
    let orch = Orchestrator::new(test_config(), storage.clone()).unwrap();

    let report = orch
        .run(&seeds(&server, &["/silverhawks", "/transformers-g1"]))
        .await
        .unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.parsed, 2);
    assert_eq!(report.summarized, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.merged, 2);

    let listings = orch.listings().unwrap();
    let silverhawks = &listings["silverhawks"];
    assert_eq!(silverhawks.record.show_title.as_deref(), Some("SilverHawks"));
    assert_eq!(silverhawks.record.manufacturer.as_deref(), Some("Kenner"));
    assert_eq!(silverhawks.record.era.as_deref(), Some("1980s"));
    assert!(!silverhawks.description_summary.is_empty());
    assert!(listings.contains_key("transformers"));

    for state in orch.status().unwrap() {
        assert_eq!(state.stage_completed, PipelineStage::Summarized);
        assert_eq!(state.last_error, None);
    }

    let log = storage::lock(&storage).record_log().unwrap();
    let stages: Vec<&str> = log
        .iter()
        .filter(|e| e.url.ends_with("/silverhawks"))
        .map(|e| e.stage.as_str())
        .collect();
    assert_eq!(stages, vec!["fetched", "parsed", "summarized", "merged"]);

    let fetched = log.iter().find(|e| e.stage == "fetched").unwrap();
    assert!(fetched.payload.get("content_bytes").is_none());
    assert_eq!(fetched.payload["http_status"], 200);
}

#[tokio::test]
async fn test_rerun_without_force_makes_no_requests() {
    let server = site().await;
    let storage = memory_storage();
    let urls = seeds(&server, &["/silverhawks", "/transformers-g1"]);

    Orchestrator::new(test_config(), storage.clone())
        .unwrap()
        .run(&urls)
        .await
        .unwrap();
    let requests_before = request_count(&server).await;
    let states_before = storage::lock(&storage).all_states().unwrap();
    let listings_before = storage::lock(&storage).load_listings().unwrap();

    let report = Orchestrator::new(test_config(), storage.clone())
        .unwrap()
        .run(&urls)
        .await
        .unwrap();

    assert_eq!(request_count(&server).await, requests_before);
    assert_eq!(storage::lock(&storage).all_states().unwrap(), states_before);
    assert_eq!(storage::lock(&storage).load_listings().unwrap(), listings_before);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.fetched + report.parsed + report.summarized, 0);
    assert_eq!(report.merged, 2);
}

#[tokio::test]
async fn test_same_title_gets_suffixed_slug_in_seed_order() {
    let server = site().await;
    let storage = memory_storage();
    let urls = seeds(&server, &["/transformers-g1", "/transformers-toys"]);

    let orch = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orch.run(&urls).await.unwrap();

    let listings = orch.listings().unwrap();
    assert_eq!(listings.len(), 2);
    assert!(listings["transformers"].record.source_url.ends_with("/transformers-g1"));
    assert!(listings["transformers-2"].record.source_url.ends_with("/transformers-toys"));

    // Reprocessing in the opposite order keeps each URL on its slug
    let mut config = test_config();
    config.pipeline.force_parse = true;
    let reversed: Vec<String> = urls.iter().rev().cloned().collect();
    Orchestrator::new(config, storage.clone())
        .unwrap()
        .run(&reversed)
        .await
        .unwrap();

    let listings = storage::lock(&storage).load_listings().unwrap();
    assert_eq!(listings.len(), 2);
    assert!(listings["transformers"].record.source_url.ends_with("/transformers-g1"));
    assert!(listings["transformers-2"].record.source_url.ends_with("/transformers-toys"));
}

#[tokio::test]
async fn test_failed_fetch_leaves_stage_none_and_continues() {
    let server = site().await;
    let storage = memory_storage();
    let orch = Orchestrator::new(test_config(), storage.clone()).unwrap();

    let report = orch
        .run(&seeds(&server, &["/broken", "/silverhawks"]))
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.merged, 1);

    let states = orch.status().unwrap();
    let broken = states.iter().find(|s| s.url.ends_with("/broken")).unwrap();
    assert_eq!(broken.stage_completed, PipelineStage::None);
    assert_eq!(broken.error_kind, Some(ErrorKind::NetworkTransient));
    assert!(broken.last_error.as_deref().unwrap().contains("4 attempts"));
    assert!(broken.last_attempt.is_some());

    let broken_hits = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/broken")
        .count();
    assert_eq!(broken_hits, 4);

    // A failed URL is retried on the next run
    let report = Orchestrator::new(test_config(), storage.clone())
        .unwrap()
        .run(&seeds(&server, &["/broken", "/silverhawks"]))
        .await
        .unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_robots_disallowed_seed_is_reported() {
    let server = site().await;
    Mock::given(method("GET"))
        .and(path("/private/notes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let orch = Orchestrator::new(test_config(), memory_storage()).unwrap();
    let report = orch.run(&seeds(&server, &["/private/notes"])).await.unwrap();

    assert_eq!(report.failed, 1);
    let state = &orch.status().unwrap()[0];
    assert_eq!(state.stage_completed, PipelineStage::None);
    assert_eq!(state.error_kind, Some(ErrorKind::RobotsDisallowed));
}

#[tokio::test]
async fn test_force_summarize_skips_network() {
    let server = site().await;
    let storage = memory_storage();
    let urls = seeds(&server, &["/silverhawks"]);

    Orchestrator::new(test_config(), storage.clone())
        .unwrap()
        .run(&urls)
        .await
        .unwrap();
    let requests_before = request_count(&server).await;

    let mut config = test_config();
    config.pipeline.force_summarize = true;
    let report = Orchestrator::new(config, storage.clone())
        .unwrap()
        .run(&urls)
        .await
        .unwrap();

    assert_eq!(request_count(&server).await, requests_before);
    assert_eq!((report.fetched, report.parsed, report.summarized), (0, 0, 1));
}

#[tokio::test]
async fn test_force_fetch_cascades_and_keeps_first_seen() {
    let server = site().await;
    let storage = memory_storage();
    let urls = seeds(&server, &["/silverhawks"]);

    Orchestrator::new(test_config(), storage.clone())
        .unwrap()
        .run(&urls)
        .await
        .unwrap();
    let first_seen = storage::lock(&storage).load_listings().unwrap()["silverhawks"].first_seen;

    let mut config = test_config();
    config.pipeline.force_fetch = true;
    let report = Orchestrator::new(config, storage.clone())
        .unwrap()
        .run(&urls)
        .await
        .unwrap();

    assert_eq!((report.fetched, report.parsed, report.summarized), (1, 1, 1));
    let listings = storage::lock(&storage).load_listings().unwrap();
    assert_eq!(listings["silverhawks"].first_seen, first_seen);
}

#[tokio::test]
async fn test_model_backend_summary_is_used() {
    let server = site().await;
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Here is a summary:\nSilverHawks are partly metal, partly real.",
            "done": true
        })))
        .mount(&backend)
        .await;

    let mut config = test_config();
    config.summarizer.generation_backend_endpoint = Some(backend.uri());
    let orch = Orchestrator::new(config, memory_storage()).unwrap();
    orch.run(&seeds(&server, &["/silverhawks"])).await.unwrap();

    assert_eq!(
        orch.listings().unwrap()["silverhawks"].description_summary,
        "SilverHawks are partly metal, partly real."
    );
}

#[tokio::test]
async fn test_unreachable_backend_falls_back_to_textrank() {
    let server = site().await;
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;

    let storage = memory_storage();
    let mut config = test_config();
    config.summarizer.generation_backend_endpoint = Some(backend.uri());
    let orch = Orchestrator::new(config, storage.clone()).unwrap();
    let report = orch.run(&seeds(&server, &["/silverhawks"])).await.unwrap();

    assert_eq!(report.summarized, 1);
    assert_eq!(report.failed, 0);

    let stored = storage::lock(&storage)
        .get_extracted(&format!("{}/silverhawks", server.uri()))
        .unwrap()
        .unwrap();
    let listing = &orch.listings().unwrap()["silverhawks"];
    assert_eq!(Some(listing.description_summary.clone()), stored.summary);

    let log = storage::lock(&storage).record_log().unwrap();
    let summarized = log.iter().find(|e| e.stage == "summarized").unwrap();
    assert_eq!(summarized.payload["strategy"], "textrank");
    assert_eq!(summarized.payload["error_kind"], "summarization_backend_unavailable");
}

#[tokio::test]
async fn test_export_writes_dataset_and_log() {
    let server = site().await;
    let dir = TempDir::new().unwrap();
    let storage = open_shared(&dir.path().join("pipeline.db")).unwrap();

    Orchestrator::new(test_config(), storage.clone())
        .unwrap()
        .run(&seeds(&server, &["/silverhawks"]))
        .await
        .unwrap();

    let exporter = JsonExporter::new(dir.path().join("listings.json"), dir.path().join("records.jsonl"));
    export_all(&*storage::lock(&storage), &exporter).unwrap();

    let dataset: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("listings.json")).unwrap()).unwrap();
    assert_eq!(dataset["silverhawks"]["slug"], "silverhawks");
    assert!(dataset["silverhawks"]["first_seen"].is_string());

    let log = std::fs::read_to_string(dir.path().join("records.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 4);
}

#[test]
fn test_fallback_summary_is_deterministic() {
    let text = "Jem is a rock star. Jem and the Holograms fight the Misfits. \
                The Misfits cheat. Jem wins the Battle of the Bands. Rain fell.";
    let textrank = TextRank::default();
    let first = textrank.summarize(text, 2);
    assert!(!first.is_empty());
    for _ in 0..5 {
        assert_eq!(textrank.summarize(text, 2), first);
    }
}
