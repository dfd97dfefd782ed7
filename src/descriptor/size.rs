//! Photo size codes and the static-content host used to synthesize URLs.

use std::fmt;

/// Default static host template; `{farm}` is replaced by the photo's farm id.
pub const DEFAULT_STATIC_HOST: &str = "https://farm{farm}.staticflickr.com";

/// Size variants served by the photo host.
///
/// Every variant except [`PhotoSize::Original`] always exists on the host.
/// The original may be missing for photos whose owners restrict downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoSize {
    /// 75x75 square (`s`).
    TinySquare,
    /// 150x150 square (`q`).
    SmallSquare,
    /// 320 px on the longest side (`n`); the thumbnail tier.
    Small,
    /// 640 px on the longest side (`z`).
    Medium,
    /// 1024 px on the longest side (`b`).
    Large,
    /// 2048 px on the longest side (`k`).
    ExtraLarge,
    /// The uploaded original (`o`).
    Original,
}

impl PhotoSize {
    /// All size variants, smallest first.
    pub const ALL: [PhotoSize; 7] = [
        Self::TinySquare,
        Self::SmallSquare,
        Self::Small,
        Self::Medium,
        Self::Large,
        Self::ExtraLarge,
        Self::Original,
    ];

    /// Returns the one-letter suffix used in photo URLs.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::TinySquare => "s",
            Self::SmallSquare => "q",
            Self::Small => "n",
            Self::Medium => "z",
            Self::Large => "b",
            Self::ExtraLarge => "k",
            Self::Original => "o",
        }
    }

    /// Returns a human readable label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TinySquare => "tiny-square",
            Self::SmallSquare => "small-square",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::ExtraLarge => "extra-large",
            Self::Original => "original",
        }
    }
}

impl fmt::Display for PhotoSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PhotoSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.code() == s || size.as_str() == s)
            .ok_or_else(|| format!("invalid photo size: {s}"))
    }
}

/// Base URL template for synthesized photo URLs.
///
/// Defaults to the public static-content farms. Mirrors and test servers can
/// supply their own template; `{farm}` is substituted when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticHost {
    template: String,
}

impl Default for StaticHost {
    fn default() -> Self {
        Self::new(DEFAULT_STATIC_HOST)
    }
}

impl StaticHost {
    /// Creates a host from a base URL template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let template = template.trim_end_matches('/').to_string();
        Self { template }
    }

    /// Returns the base URL for the given farm.
    #[must_use]
    pub fn base_for(&self, farm: &str) -> String {
        self.template.replace("{farm}", farm)
    }

    /// Returns the raw template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }
}
