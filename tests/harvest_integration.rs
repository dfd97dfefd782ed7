//! Integration tests for the batch ingestion loop.
//!
//! Most scenarios use a recording in-process fetcher; the last one runs the
//! real HTTP worker against a mock photo host.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use harvester_core::fetch::{FetchError, ImageMeta, PhotoFetcher};
use harvester_core::{
    FailureKind, FetchResult, HarvestConfig, HarvestSummary, Harvester, NoProgress,
    PhotoDescriptor, ProgressReporter,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::fixtures::{mock_host, photo_path, png, record, records, stored_name, write_batch};
use support::socket_guard::{socket_skip_return, start_mock_server_or_skip};

/// Records every `(id, subdir)` it is asked to fetch.
#[derive(Default)]
struct RecordingFetcher {
    calls: Mutex<Vec<(String, Option<String>)>>,
    reject: Vec<String>,
}

impl RecordingFetcher {
    fn rejecting(ids: &[&str]) -> Self {
        Self {
            calls: Mutex::default(),
            reject: ids.iter().map(|id| (*id).to_string()).collect(),
        }
    }

    fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    fn ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl PhotoFetcher for RecordingFetcher {
    async fn fetch(
        &self,
        descriptor: &PhotoDescriptor,
        subdir: Option<&str>,
    ) -> Result<ImageMeta, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((descriptor.id().to_string(), subdir.map(str::to_string)));
        if self.reject.iter().any(|id| id == descriptor.id()) {
            return Err(FetchError::ThumbnailInvalid {
                width: 1,
                height: 1,
                min_edge: 75,
            });
        }
        Ok(ImageMeta {
            img_path: PathBuf::from(format!("{}.jpg", descriptor.id())),
        })
    }
}

/// Counts progress callbacks.
#[derive(Default)]
struct CountingProgress {
    completed: Mutex<Vec<usize>>,
    submitted: Mutex<Vec<usize>>,
}

impl ProgressReporter for CountingProgress {
    fn on_submitted(&self, submitted: usize) {
        self.submitted.lock().unwrap().push(submitted);
    }

    fn on_completed(&self, _result: &FetchResult, completed: usize, _submitted: usize) {
        self.completed.lock().unwrap().push(completed);
    }
}

fn config(dir: &TempDir) -> HarvestConfig {
    let mut config = HarvestConfig::new(dir.path().join("crawled"), dir.path().join("output"));
    config.workers = 2;
    config.write_manifest = false;
    config
}

async fn run_with(config: HarvestConfig, fetcher: Arc<RecordingFetcher>) -> HarvestSummary {
    Harvester::with_fetcher(config, fetcher)
        .unwrap()
        .run(&NoProgress)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_same_id_in_later_batch_is_fetched_once() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crawled");
    let mut variant = record("1");
    variant["owner"] = json!("99999@N01");
    variant["secret"] = json!("other");
    variant["server"] = json!("4242");
    variant["farm"] = json!(9);
    write_batch(&input, "20200101_0000.json", &[record("1"), record("2")]);
    write_batch(&input, "20200102_0000.json", &[variant, record("3")]);

    let fetcher = Arc::new(RecordingFetcher::default());
    let summary = run_with(config(&dir), fetcher.clone()).await;

    assert_eq!(summary.batches, 2);
    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.submitted, 3);
    assert_eq!(summary.succeeded, 3);

    let first: Vec<_> = fetcher
        .calls()
        .into_iter()
        .filter(|(id, _)| id == "1")
        .collect();
    assert_eq!(
        first,
        vec![("1".to_string(), Some("20200101_0000".to_string()))]
    );
}

#[tokio::test]
async fn test_cap_is_checked_between_batches() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crawled");
    write_batch(&input, "a.json", &records(0, 6));
    write_batch(&input, "b.json", &records(6, 6));
    write_batch(&input, "c.json", &records(12, 6));

    let mut config = config(&dir);
    config.max_images = Some(10);
    let fetcher = Arc::new(RecordingFetcher::default());
    let summary = run_with(config, fetcher.clone()).await;

    assert_eq!(summary.submitted, 12);
    assert_eq!(summary.batches, 2);
    assert!(summary.cap_reached);
    assert_eq!(summary.succeeded, 12);
    let ids = fetcher.ids();
    assert!(ids.iter().all(|id| id.parse::<usize>().unwrap() < 12));
}

#[tokio::test]
async fn test_zero_cap_means_no_cap() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crawled");
    write_batch(&input, "a.json", &records(0, 3));
    write_batch(&input, "b.json", &records(3, 3));

    let mut config = config(&dir);
    config.max_images = Some(0);
    let summary = run_with(config, Arc::new(RecordingFetcher::default())).await;

    assert_eq!(summary.submitted, 6);
    assert!(!summary.cap_reached);
}

#[tokio::test]
async fn test_malformed_record_is_skipped() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crawled");
    let mut broken = record("3");
    broken.as_object_mut().unwrap().remove("secret");
    write_batch(
        &input,
        "batch.json",
        &[record("1"), record("2"), broken, record("4"), record("5")],
    );

    let fetcher = Arc::new(RecordingFetcher::default());
    let summary = run_with(config(&dir), fetcher.clone()).await;

    assert_eq!(summary.submitted, 4);
    assert_eq!(summary.skipped_records, 1);
    assert!(!fetcher.ids().contains(&"3".to_string()));
}

#[tokio::test]
async fn test_empty_input_root_yields_empty_summary() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("crawled")).unwrap();

    let fetcher = Arc::new(RecordingFetcher::default());
    let summary = run_with(config(&dir), fetcher.clone()).await;

    assert_eq!(summary, HarvestSummary::default());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_unreadable_batch_is_skipped() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crawled");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("a.json"), "{ not json").unwrap();
    std::fs::write(input.join("b.json"), r#"{"photos": []}"#).unwrap();
    write_batch(&input, "c.json", &records(0, 2));

    let summary = run_with(config(&dir), Arc::new(RecordingFetcher::default())).await;

    assert_eq!(summary.unreadable_batches, 2);
    assert_eq!(summary.batches, 1);
    assert_eq!(summary.submitted, 2);
}

#[tokio::test]
async fn test_subdir_follows_batch_stem() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crawled");
    write_batch(&input, "cats/20210101_0500.json", &[record("1")]);

    let fetcher = Arc::new(RecordingFetcher::default());
    run_with(config(&dir), fetcher.clone()).await;
    assert_eq!(
        fetcher.calls(),
        vec![("1".to_string(), Some("20210101_0500".to_string()))]
    );

    let mut flat = config(&dir);
    flat.create_subdirs = false;
    let fetcher = Arc::new(RecordingFetcher::default());
    run_with(flat, fetcher.clone()).await;
    assert_eq!(fetcher.calls(), vec![("1".to_string(), None)]);
}

#[tokio::test]
async fn test_failures_are_counted_by_kind() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crawled");
    write_batch(&input, "a.json", &records(0, 5));

    let fetcher = Arc::new(RecordingFetcher::rejecting(&["1", "3"]));
    let progress = CountingProgress::default();
    let summary = Harvester::with_fetcher(config(&dir), fetcher)
        .unwrap()
        .run(&progress)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.failures.get(&FailureKind::ThumbnailInvalid), Some(&2));
    assert_eq!(*progress.submitted.lock().unwrap(), vec![5]);
    assert_eq!(*progress.completed.lock().unwrap(), vec![1, 2, 3, 4, 5]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_nested_batches_are_discovered_on_multi_thread_runtime() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crawled");
    write_batch(&input, "dogs/b.json", &[record("2")]);
    write_batch(&input, "cats/deep/a.json", &[record("1")]);
    std::fs::write(input.join("notes.txt"), "not a batch").unwrap();

    let fetcher = Arc::new(RecordingFetcher::default());
    let summary = run_with(config(&dir), fetcher.clone()).await;

    assert_eq!(summary.batches, 2);
    assert_eq!(summary.submitted, 2);
    let mut calls = fetcher.calls();
    calls.sort();
    assert_eq!(
        calls,
        vec![
            ("1".to_string(), Some("a".to_string())),
            ("2".to_string(), Some("b".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_unwritable_image_root_fails_each_photo_and_run_completes() {
    let Some(server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crawled");
    write_batch(&input, "a.json", &[record("20"), record("21")]);

    for id in ["20", "21"] {
        Mock::given(method("GET"))
            .and(path(photo_path(id, "n")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png(320, 213)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(photo_path(id, "o")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes("full"))
            .mount(&server)
            .await;
    }

    let mut config = HarvestConfig::new(&input, dir.path().join("output"));
    config.static_host = mock_host(&server);
    std::fs::create_dir_all(&config.output_root).unwrap();
    std::fs::write(config.images_root(), "not a directory").unwrap();

    let summary = Harvester::new(config.clone())
        .unwrap()
        .run(&NoProgress)
        .await
        .unwrap();

    assert_eq!(summary.submitted, 2);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.failures.get(&FailureKind::Write), Some(&2));
    assert!(config.thumbs_root().join("a").join(stored_name("20")).exists());
    assert!(config.images_root().is_file());
}

#[tokio::test]
async fn test_end_to_end_writes_images_and_manifest() {
    let Some(server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crawled");
    write_batch(&input, "20210101_0500.json", &[record("10"), record("11")]);
    write_batch(&input, "20210102_0500.json", &[record("11"), record("12")]);

    for id in ["10", "11"] {
        Mock::given(method("GET"))
            .and(path(photo_path(id, "n")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png(320, 213)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(photo_path(id, "o")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("full {id}")))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(photo_path("12", "n")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(40, 40)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(photo_path("12", "o")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = HarvestConfig::new(&input, dir.path().join("output"));
    config.static_host = mock_host(&server);
    let summary = Harvester::new(config.clone())
        .unwrap()
        .run(&NoProgress)
        .await
        .unwrap();

    assert_eq!(summary.submitted, 3);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failures.get(&FailureKind::ThumbnailInvalid), Some(&1));

    let image = config
        .images_root()
        .join("20210101_0500")
        .join(stored_name("10"));
    assert_eq!(std::fs::read_to_string(image).unwrap(), "full 10");
    assert!(
        config
            .thumbs_root()
            .join("20210101_0500")
            .join(stored_name("11"))
            .exists()
    );

    let manifest = std::fs::read_to_string(config.manifest_path()).unwrap();
    let mut lines: Vec<Value> = manifest
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    lines.sort_by_key(|v| v["id"].as_str().unwrap().to_string());
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["id"], "10");
    assert_eq!(lines[0]["img_path"], format!("20210101_0500/{}", stored_name("10")));
    assert_eq!(lines[1]["owner"], "12345@N00");
}
