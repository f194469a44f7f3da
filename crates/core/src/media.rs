//! Media library assets.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::MediaId;

/// Broad type of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Document,
}

impl MediaKind {
    pub const ALL: &'static [Self] = &[Self::Image, Self::Video, Self::Document];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Image => "Images",
            Self::Video => "Videos",
            Self::Document => "Documents",
        }
    }

    /// Guess the kind from a file name's extension.
    #[must_use]
    pub fn from_file_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "avif" => Self::Image,
            "mp4" | "mov" | "webm" => Self::Video,
            _ => Self::Document,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("invalid media kind: {s}"))
    }
}

/// A file in the media library. Nothing is stored; the URL points at a
/// static placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: MediaId,
    pub file_name: String,
    pub kind: MediaKind,
    pub folder: String,
    pub url: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub alt_text: String,
    pub uploaded_at: DateTime<Utc>,
}

impl MediaAsset {
    /// Human-readable size, e.g. `1.2 MB`.
    #[must_use]
    pub fn size(&self) -> String {
        format_bytes(self.size_bytes)
    }

    /// `1920×1080` for images and videos with known dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Option<String> {
        Some(format!("{}×{}", self.width?, self.height?))
    }
}

/// Media library filter.
#[derive(Debug, Clone, Default)]
pub struct MediaQuery {
    pub search: Option<String>,
    pub kind: Option<MediaKind>,
    pub folder: Option<String>,
}

impl MediaQuery {
    /// Whether `asset` passes every set filter.
    #[must_use]
    pub fn matches(&self, asset: &MediaAsset) -> bool {
        if self.kind.is_some_and(|kind| kind != asset.kind) {
            return false;
        }
        if let Some(folder) = self.folder.as_deref().filter(|f| !f.is_empty())
            && asset.folder != folder
        {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => {
                let needle = needle.to_lowercase();
                asset.file_name.to_lowercase().contains(&needle)
                    || asset.alt_text.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// Format a byte count with binary units, one decimal above bytes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
