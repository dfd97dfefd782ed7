//! Two-phase fetch of a single photo.
//!
//! 1. GET the small (`n`) variant and decode its header. A longer side below
//!    [`MIN_THUMBNAIL_EDGE_PX`] means the host served a placeholder for a
//!    deleted or private photo; the original is never requested.
//! 2. Optionally persist the thumbnail under the thumbs root.
//! 3. Stream the original to `{output_root}/[{subdir}/]{basename}`.
//!
//! A failure in step 3 leaves an already written thumbnail in place.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use image::ImageReader;
use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use super::HttpClient;
use super::constants::MIN_THUMBNAIL_EDGE_PX;
use super::error::{FetchError, TransportError};
use crate::descriptor::{PhotoDescriptor, PhotoSize, StaticHost};

/// Metadata recorded for a downloaded photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMeta {
    /// Path of the full image relative to the images root.
    pub img_path: PathBuf,
}

/// Something that can fetch one photo.
///
/// # Object Safety
///
/// Uses `async_trait` so the pool can hold an `Arc<dyn PhotoFetcher>`.
#[async_trait]
pub trait PhotoFetcher: Send + Sync {
    /// Fetches the photo and stores it under the optional subdirectory.
    async fn fetch(
        &self,
        descriptor: &PhotoDescriptor,
        subdir: Option<&str>,
    ) -> Result<ImageMeta, FetchError>;
}

/// Stateless fetch worker holding only its client and storage roots.
#[derive(Debug, Clone)]
pub struct FetchWorker {
    client: HttpClient,
    output_root: PathBuf,
    thumbs_root: Option<PathBuf>,
    static_host: StaticHost,
}

impl FetchWorker {
    /// Creates a worker writing full images under `output_root`, without thumbnails.
    #[must_use]
    pub fn new(client: HttpClient, output_root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_root: output_root.into(),
            thumbs_root: None,
            static_host: StaticHost::default(),
        }
    }

    /// Persists validated thumbnails under `thumbs_root`.
    #[must_use]
    pub fn with_thumbs_root(mut self, thumbs_root: impl Into<PathBuf>) -> Self {
        self.thumbs_root = Some(thumbs_root.into());
        self
    }

    /// Synthesizes photo URLs on a different host.
    #[must_use]
    pub fn with_static_host(mut self, static_host: StaticHost) -> Self {
        self.static_host = static_host;
        self
    }

    /// Root directory for full images.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Root directory for thumbnails, when persistence is enabled.
    #[must_use]
    pub fn thumbs_root(&self) -> Option<&Path> {
        self.thumbs_root.as_deref()
    }

    /// Runs the two-phase fetch for one photo.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] naming the phase that failed. Nothing is
    /// retried here.
    #[instrument(skip(self, descriptor), fields(photo_id = %descriptor.id()))]
    pub async fn try_download(
        &self,
        descriptor: &PhotoDescriptor,
        subdir: Option<&str>,
    ) -> Result<ImageMeta, FetchError> {
        let relative = relative_path(subdir, &descriptor.basename()?);

        let thumb_url = descriptor.url_on(&self.static_host, PhotoSize::Small)?;
        let thumb = self
            .client
            .get_bytes(&thumb_url)
            .await
            .map_err(FetchError::ThumbnailFetchFailed)?;
        let (width, height) =
            thumbnail_dimensions(&thumb_url, &thumb).map_err(FetchError::ThumbnailFetchFailed)?;
        if !is_thumbnail_valid(width, height) {
            debug!(width, height, "placeholder thumbnail, skipping original");
            return Err(FetchError::ThumbnailInvalid {
                width,
                height,
                min_edge: MIN_THUMBNAIL_EDGE_PX,
            });
        }

        if let Some(thumbs_root) = &self.thumbs_root {
            let thumb_path = thumbs_root.join(&relative);
            write_file(&thumb_path, &thumb).await?;
            debug!(path = %thumb_path.display(), "thumbnail written");
        }

        let full_url = descriptor.url_on(&self.static_host, PhotoSize::Original)?;
        let response = self
            .client
            .get(&full_url)
            .await
            .map_err(FetchError::FullFetchFailed)?;
        let image_path = self.output_root.join(&relative);
        let bytes = stream_to_path(response, &full_url, &image_path).await?;

        info!(path = %image_path.display(), bytes, "photo downloaded");
        Ok(ImageMeta { img_path: relative })
    }
}

#[async_trait]
impl PhotoFetcher for FetchWorker {
    async fn fetch(
        &self,
        descriptor: &PhotoDescriptor,
        subdir: Option<&str>,
    ) -> Result<ImageMeta, FetchError> {
        self.try_download(descriptor, subdir).await
    }
}

/// Returns true unless both sides are below [`MIN_THUMBNAIL_EDGE_PX`].
#[must_use]
pub fn is_thumbnail_valid(width: u32, height: u32) -> bool {
    width.max(height) >= MIN_THUMBNAIL_EDGE_PX
}

/// Reads image dimensions from the header of an encoded image.
///
/// # Errors
///
/// Returns [`TransportError::Decode`] when the format is unknown or the
/// header is corrupt.
pub fn thumbnail_dimensions(url: &str, bytes: &[u8]) -> Result<(u32, u32), TransportError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| TransportError::decode(url, image::ImageError::IoError(e)))?;
    reader
        .into_dimensions()
        .map_err(|e| TransportError::decode(url, e))
}

fn relative_path(subdir: Option<&str>, basename: &str) -> PathBuf {
    match subdir {
        Some(subdir) => Path::new(subdir).join(basename),
        None => PathBuf::from(basename),
    }
}

async fn ensure_parent(path: &Path) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::write(parent, e))?;
    }
    Ok(())
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    ensure_parent(path).await?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| FetchError::write(path, e))
}

/// Streams the response body to `path`, removing the partial file on error.
async fn stream_to_path(
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, FetchError> {
    ensure_parent(path).await?;
    let file = File::create(path)
        .await
        .map_err(|e| FetchError::write(path, e))?;

    let result = stream_body(file, response, url, path).await;
    if result.is_err() {
        debug!(path = %path.display(), "cleaning up partial image after error");
        let _ = tokio::fs::remove_file(path).await;
    }
    result
}

async fn stream_body(
    file: File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| FetchError::FullFetchFailed(TransportError::network(url, e)))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::write(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::write(path, e))?;

    Ok(bytes_written)
}
