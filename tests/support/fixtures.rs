//! Builders for batch files, records and thumbnail images.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use harvester_core::StaticHost;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::{Value, json};
use wiremock::MockServer;

/// Farm id used by every fixture record.
pub const FARM: &str = "1";

/// Server id used by every fixture record.
pub const SERVER: &str = "65535";

/// Encodes a black PNG of the given size.
#[must_use]
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode png fixture");
    buf.into_inner()
}

/// A well-formed crawl record whose secret is `s{id}`.
#[must_use]
pub fn record(id: &str) -> Value {
    json!({
        "id": id,
        "owner": "12345@N00",
        "secret": format!("s{id}"),
        "server": SERVER,
        "farm": 1,
        "title": format!("photo {id}"),
    })
}

/// Records for ids `start..start + count`.
#[must_use]
pub fn records(start: usize, count: usize) -> Vec<Value> {
    (start..start + count)
        .map(|id| record(&id.to_string()))
        .collect()
}

/// Writes `records` as a JSON array at `root/relative`.
pub fn write_batch(root: &Path, relative: &str, records: &[Value]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create batch dir");
    }
    std::fs::write(&path, serde_json::to_vec(records).expect("serialize batch"))
        .expect("write batch");
    path
}

/// Static host template pointing at the mock server.
#[must_use]
pub fn mock_host(server: &MockServer) -> StaticHost {
    StaticHost::new(format!("{}/farm{{farm}}", server.uri()))
}

/// Request path of the `size` variant of fixture photo `id`.
#[must_use]
pub fn photo_path(id: &str, size_code: &str) -> String {
    format!("/farm{FARM}/{SERVER}/{id}_s{id}_{size_code}.jpg")
}

/// Stored file name of fixture photo `id`.
#[must_use]
pub fn stored_name(id: &str) -> String {
    format!("{id}_s{id}.jpg")
}
