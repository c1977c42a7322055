//! End-to-end: raw collector output through normalization, dedup,
//! discovery and scoring.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fsbo_scout::clock::ManualClock;
use fsbo_scout::dedup::FingerprintConfig;
use fsbo_scout::discovery::{JsonFileRepository, MemoryRepository};
use fsbo_scout::error::RemoteResult;
use fsbo_scout::remote::{JobApi, Orchestrator, OrchestratorConfig, ResultsPage, RunInfo};
use fsbo_scout::scrapers::{RawBatch, RemoteJobScraper, ScraperTrait};
use fsbo_scout::{Pipeline, PipelineOptions, Platform};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap()))
}

fn collector_dump() -> Value {
    json!({
        "all_ads": [
            {
                "source": "idealista", "ad_id": "33501", "url": "https://www.idealista.pt/imovel/33501/",
                "title": "T2 em Benfica", "price": "245.000 €",
                "property": {"tipology": "T2", "area_useful": "78 m²"},
                "photos": ["1.jpg", "2.jpg", "3.jpg"],
                "advertiser": {"name": "Rui Costa", "total_ads": 0, "phone": "913 000 111", "is_agency": false},
                "signals": {"is_agency": true}
            },
            {
                "source": "idealista", "ad_id": "33502", "url": "https://www.idealista.pt/imovel/33502/",
                "title": "Moradia V4", "price": 720000,
                "photos": (0..30).map(|i| format!("{}.jpg", i)).collect::<Vec<_>>(),
                "advertiser": {"name": "Remax Prime", "total_ads": "150", "is_agency": "true"},
                "signals": {"watermark": true, "professional_photos": 1, "agency_keywords": ["ami", "lda"]}
            },
            {
                "source": "idealista", "ad_id": "33501", "url": "https://www.idealista.pt/imovel/33501/",
                "title": "T2 em Benfica (repost)", "price": 245000,
                "property": {"tipology": "T2", "area_useful": 78},
                "advertiser": {"phone": "913000111"}
            },
            {
                "title": "Sem identificador", "price": "99 000"
            },
            "garbage"
        ]
    })
}

#[tokio::test]
async fn processes_a_collector_dump() {
    let raws = RawBatch::from_value(collector_dump()).records;
    assert_eq!(raws.len(), 5);

    let pipeline = Pipeline::with_clock(MemoryRepository::new(), FingerprintConfig::default(), clock());
    let batch = pipeline.run("idealista", &raws, PipelineOptions::default()).await;

    assert_eq!(batch.duplicates_removed, 1);
    assert_eq!(batch.total_results, 4);
    assert_eq!(batch.items.len(), 4);
    assert_eq!(batch.new_count, 2);

    let private = &batch.items[0];
    assert_eq!(private.listing.title, "T2 em Benfica");
    assert_eq!(private.listing.price, "245000");
    assert!(private.is_new);
    assert!(private.private_score >= 70, "private score {}", private.private_score);

    let agency = &batch.items[1];
    assert!(agency.private_score <= 20, "agency score {}", agency.private_score);
    assert!(!agency.score_reasons.is_empty());

    // No id: kept in output but never tracked as new
    assert!(!batch.items[2].is_new);
    assert!(!batch.items[3].is_new);

    let json = serde_json::to_value(&batch).unwrap();
    assert_eq!(json["items"][0]["_fingerprint"].as_str().unwrap().len(), 32);
    assert!(json["items"][0]["signals"].get("is_agency").is_none());
    assert_eq!(json["items"][0]["advertiser"]["is_agency"], json!(false));
}

#[tokio::test]
async fn second_run_reports_nothing_new() {
    let raws = RawBatch::from_value(collector_dump()).records;
    let clock = clock();
    let pipeline = Pipeline::with_clock(MemoryRepository::new(), FingerprintConfig::default(), clock.clone());

    pipeline.run("idealista", &raws, PipelineOptions::default()).await;
    clock.advance(Duration::from_secs(86_400));

    let again = pipeline.run("idealista", &raws, PipelineOptions { only_new: true }).await;
    assert_eq!(again.new_count, 0);
    assert!(again.items.is_empty());
    assert_eq!(again.duplicates_removed, 1);
}

#[tokio::test]
async fn discovery_survives_restarts_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let raws = vec![json!({"ad_id": "x1", "url": "https://olx.pt/x1"}), json!({"ad_id": "x2", "url": "https://olx.pt/x2"})];

    let first = Pipeline::with_clock(JsonFileRepository::new(dir.path()), FingerprintConfig::default(), clock());
    assert_eq!(first.run("olx", &raws, PipelineOptions::default()).await.new_count, 2);
    drop(first);

    let second = Pipeline::with_clock(JsonFileRepository::new(dir.path()), FingerprintConfig::default(), clock());
    let mixed = vec![raws[0].clone(), json!({"ad_id": "x3", "url": "https://olx.pt/x3"})];
    assert_eq!(second.run("olx", &mixed, PipelineOptions::default()).await.new_count, 1);

    let stored: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("olx_discovery.json")).unwrap()).unwrap();
    assert_eq!(stored["ads"].as_object().unwrap().len(), 3);
    assert!(stored["lastRun"].is_string());
}

struct OnePageApi;

#[async_trait]
impl JobApi for OnePageApi {
    async fn create_task(&self, _squid_id: &str, _search_url: Option<&str>) -> RemoteResult<String> {
        Ok("t".into())
    }

    async fn create_run(&self, _squid_id: &str) -> RemoteResult<RunInfo> {
        Ok(RunInfo { id: "r".into(), status: "pending".into() })
    }

    async fn get_run(&self, run_id: &str) -> RemoteResult<RunInfo> {
        Ok(RunInfo { id: run_id.into(), status: "completed".into() })
    }

    async fn get_results(&self, _s: &str, _r: &str, _page: u32, _size: u32) -> RemoteResult<ResultsPage> {
        Ok(ResultsPage {
            results: vec![
                json!({"ad_id": "a1", "url": "https://www.idealista.pt/imovel/a1/", "price": "150 000"}),
                json!({"ad_id": "a2", "url": "https://www.idealista.pt/imovel/a2/", "source": "custom"}),
            ],
            total: Some(2),
            next: None,
        })
    }
}

#[tokio::test]
async fn remote_job_feeds_the_pipeline() {
    let clock = clock();
    let orchestrator = Orchestrator::with_clock(OnePageApi, OrchestratorConfig::default(), clock.clone());
    let scraper = RemoteJobScraper::new(Platform::Idealista, orchestrator, "squid-1")
        .with_search_url("https://www.idealista.pt/comprar-casas/lisboa/");

    let raws = scraper.collect().await.unwrap();
    assert_eq!(raws[0]["source"], "idealista");
    assert_eq!(raws[1]["source"], "custom");

    let pipeline = Pipeline::with_clock(MemoryRepository::new(), FingerprintConfig::default(), clock);
    let batch = pipeline.run(scraper.source_name(), &raws, PipelineOptions::default()).await;
    assert_eq!(batch.total_results, 2);
    assert_eq!(batch.items[0].listing.price, "150000");
}
