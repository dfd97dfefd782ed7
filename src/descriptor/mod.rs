//! Photo descriptors parsed from crawl batch records.
//!
//! A [`PhotoDescriptor`] identifies one remote photo and knows how to build
//! the URL of any of its size variants. Identity is the photo id alone: two
//! descriptors with the same id are the same photo, whatever their other
//! metadata says.
//!
//! # Example
//!
//! ```
//! use harvester_core::descriptor::{PhotoDescriptor, PhotoSize};
//!
//! let photo = PhotoDescriptor::new("123", Some("abc".into()), Some("65535".into()))
//!     .unwrap()
//!     .with_farm("66");
//! assert_eq!(
//!     photo.url(PhotoSize::Small).unwrap(),
//!     "https://farm66.staticflickr.com/65535/123_abc_n.jpg"
//! );
//! assert_eq!(photo.basename().unwrap(), "123_abc.jpg");
//! ```

mod error;
mod size;

pub use error::DescriptorError;
pub use size::{DEFAULT_STATIC_HOST, PhotoSize, StaticHost};

use std::hash::{Hash, Hasher};

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

/// Suffix of the original-size file name; rewritten so all variants share one name.
const ORIGINAL_SUFFIX: &str = "_o.jpg";

/// One remote photo, as described by a crawl record.
///
/// Immutable after construction. Serializes back to the record layout used
/// by the crawl stage (optional fields are omitted when absent).
#[derive(Debug, Clone, Serialize)]
pub struct PhotoDescriptor {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
    secret: String,
    server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    farm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(rename = "url_o", skip_serializing_if = "Option::is_none")]
    original_url: Option<String>,
    #[serde(rename = "size_o", skip_serializing_if = "Option::is_none")]
    original_size: Option<(u32, u32)>,
}

impl PhotoDescriptor {
    /// Creates a descriptor from its identifying fields.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidDescriptor`] when the id is empty or
    /// when `secret` or `server` is missing or empty; no URL can be built
    /// without them.
    pub fn new(
        id: impl Into<String>,
        secret: Option<String>,
        server: Option<String>,
    ) -> Result<Self, DescriptorError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DescriptorError::missing_field("id"));
        }
        let secret = secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DescriptorError::missing_field("secret"))?;
        let server = server
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DescriptorError::missing_field("server"))?;

        Ok(Self {
            id,
            owner: None,
            secret,
            server,
            farm: None,
            title: None,
            original_url: None,
            original_size: None,
        })
    }

    /// Builds a descriptor from one JSON record of a crawl batch.
    ///
    /// `id`, `server` and `farm` may be strings or numbers. Original
    /// dimensions come from `width_o`/`height_o` or from a packed `size_o`
    /// pair; when neither is usable the dimensions are simply absent.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidDescriptor`] when the record is not
    /// an object or lacks `id`, `secret` or `server`.
    pub fn from_record(record: &Value) -> Result<Self, DescriptorError> {
        let Value::Object(fields) = record else {
            return Err(DescriptorError::invalid("record is not a JSON object"));
        };

        let id = text_field(fields, "id").ok_or_else(|| DescriptorError::missing_field("id"))?;
        let mut descriptor = Self::new(
            id,
            text_field(fields, "secret"),
            text_field(fields, "server"),
        )?;
        descriptor.owner = text_field(fields, "owner");
        descriptor.farm = text_field(fields, "farm");
        descriptor.title = text_field(fields, "title");
        descriptor.original_url = text_field(fields, "url_o");
        descriptor.original_size = original_size(fields);
        Ok(descriptor)
    }

    /// Sets the owner id.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Sets the farm id used to synthesize URLs.
    #[must_use]
    pub fn with_farm(mut self, farm: impl Into<String>) -> Self {
        self.farm = Some(farm.into());
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets an explicit original-size URL.
    #[must_use]
    pub fn with_original_url(mut self, url: impl Into<String>) -> Self {
        self.original_url = Some(url.into());
        self
    }

    /// Sets the original dimensions.
    #[must_use]
    pub fn with_original_size(mut self, width: u32, height: u32) -> Self {
        self.original_size = Some((width, height));
        self
    }

    /// Returns the photo id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the owner id, if recorded.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns the secret token.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Returns the server id.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Returns the farm id, if recorded.
    #[must_use]
    pub fn farm(&self) -> Option<&str> {
        self.farm.as_deref()
    }

    /// Returns the title, if recorded.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the explicit original-size URL, if recorded.
    #[must_use]
    pub fn original_url(&self) -> Option<&str> {
        self.original_url.as_deref()
    }

    /// Returns the original `(width, height)`, if recorded.
    #[must_use]
    pub fn original_size(&self) -> Option<(u32, u32)> {
        self.original_size
    }

    /// Returns the URL of the given size on the default static host.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::UnsupportedSize`] when no explicit URL
    /// exists for the size and the farm is unknown.
    pub fn url(&self, size: PhotoSize) -> Result<String, DescriptorError> {
        self.url_on(&StaticHost::default(), size)
    }

    /// Returns the URL of the given size on `host`.
    ///
    /// An explicit original URL always wins for [`PhotoSize::Original`],
    /// whatever the host.
    ///
    /// # Errors
    ///
    /// Same as [`url`](Self::url).
    pub fn url_on(&self, host: &StaticHost, size: PhotoSize) -> Result<String, DescriptorError> {
        if size == PhotoSize::Original
            && let Some(url) = &self.original_url
        {
            return Ok(url.clone());
        }

        let Some(farm) = self.farm.as_deref() else {
            return Err(DescriptorError::unsupported_size(&self.id, size));
        };

        Ok(format!(
            "{}/{}/{}_{}_{}.jpg",
            host.base_for(farm),
            self.server,
            self.id,
            self.secret,
            size.code()
        ))
    }

    /// Returns the canonical storage file name.
    ///
    /// Taken from the last path segment of the original-size URL, with the
    /// `_o.jpg` suffix rewritten to `.jpg` so thumbnails and full images of
    /// the same photo share one name.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::UnsupportedSize`] when the original URL
    /// cannot be built, or [`DescriptorError::InvalidDescriptor`] when it has
    /// no file name.
    pub fn basename(&self) -> Result<String, DescriptorError> {
        let url = self.url(PhotoSize::Original)?;
        let name = last_path_segment(&url);
        if name.is_empty() {
            return Err(DescriptorError::invalid(format!(
                "original URL for photo {} has no file name: {url}",
                self.id
            )));
        }

        Ok(match name.strip_suffix(ORIGINAL_SUFFIX) {
            Some(stem) => format!("{stem}.jpg"),
            None => name,
        })
    }
}

impl PartialEq for PhotoDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PhotoDescriptor {}

impl Hash for PhotoDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn last_path_segment(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url)
        && let Some(mut segments) = parsed.path_segments()
    {
        return segments.next_back().unwrap_or_default().to_string();
    }

    // Not an absolute URL: strip query/fragment by hand.
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default().to_string()
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn dimension(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        _ => None,
    }
}

fn original_size(fields: &Map<String, Value>) -> Option<(u32, u32)> {
    if let (Some(width), Some(height)) = (fields.get("width_o"), fields.get("height_o")) {
        return dimension(width).zip(dimension(height));
    }

    match fields.get("size_o")? {
        Value::Array(pair) if pair.len() == 2 => dimension(&pair[0]).zip(dimension(&pair[1])),
        _ => None,
    }
}
