//! Library service records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lenient;

/// Catalog identifier as stored by the library.
///
/// The library has been seen to report it as an integer, a numeric string,
/// or a `cv:`-prefixed string. The raw value is kept for display. Other
/// shapes (floats, negatives, booleans) decode to `None` through
/// [`lenient::catalog_id`] so one odd record never sinks a whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogId {
    Numeric(u64),
    Text(String),
}

impl CatalogId {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            CatalogId::Numeric(n) => Some(*n),
            CatalogId::Text(s) => {
                let s = s.trim();
                s.strip_prefix("cv:").unwrap_or(s).parse().ok()
            }
        }
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogId::Numeric(n) => write!(f, "{}", n),
            CatalogId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for CatalogId {
    fn from(id: u64) -> Self {
        CatalogId::Numeric(id)
    }
}

/// A volume owned by the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryVolume {
    #[serde(default, deserialize_with = "lenient::count")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::catalog_id")]
    pub comicvine_id: Option<CatalogId>,
    #[serde(default = "lenient::unknown", deserialize_with = "lenient::text_or_unknown")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub year: Option<i64>,
    #[serde(default = "lenient::unknown", deserialize_with = "lenient::text_or_unknown")]
    pub publisher: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub issue_count: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub issues_downloaded: u64,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub monitored: bool,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub description: String,
}

impl LibraryVolume {
    pub fn catalog_id(&self) -> Option<u64> {
        self.comicvine_id.as_ref().and_then(CatalogId::as_u64)
    }

    pub fn display_title(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// A catalog-side search hit as proxied by the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySearchResult {
    #[serde(default, deserialize_with = "lenient::catalog_id")]
    pub comicvine_id: Option<CatalogId>,
    #[serde(default = "lenient::unknown", deserialize_with = "lenient::text_or_unknown")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub year: Option<i64>,
    #[serde(default = "lenient::unknown", deserialize_with = "lenient::text_or_unknown")]
    pub publisher: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub issue_count: u64,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub cover_link: String,
    /// Library volume id when this series is already in the library.
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub already_added: Option<u64>,
}

impl LibrarySearchResult {
    pub fn catalog_id(&self) -> Option<u64> {
        self.comicvine_id.as_ref().and_then(CatalogId::as_u64)
    }

    /// Cover link, upgraded to the medium rendition for catalog-hosted images.
    pub fn cover_url(&self) -> Option<String> {
        let link = self.cover_link.trim();
        if link.is_empty() {
            return None;
        }
        if link.contains("comicvine.gamespot.com") {
            for small in ["scale_small", "scale_avatar"] {
                if link.contains(small) {
                    return Some(link.replacen(small, "scale_medium", 1));
                }
            }
        }
        Some(link.to_string())
    }
}

/// Server-side filter for the volume list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeFilter {
    Wanted,
    Monitored,
}

impl VolumeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeFilter::Wanted => "wanted",
            VolumeFilter::Monitored => "monitored",
        }
    }
}

/// Request to start tracking a catalog volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddVolumeRequest {
    pub catalog_id: u64,
    /// Used for logging only.
    pub title: String,
}

/// Result of an add request that reached the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddOutcome {
    Added { volume_id: u64 },
    AlreadyExists { message: String },
    Rejected { reason: String },
}

/// Sort a failed add into "already there" or "refused".
///
/// The library reports duplicates only through its error text, so this is a
/// substring match on the wording it uses today.
pub fn classify_add_failure(message: &str) -> AddOutcome {
    let lower = message.to_lowercase();
    if lower.contains("unique constraint failed") || lower.contains("already exists") {
        AddOutcome::AlreadyExists {
            message: message.to_string(),
        }
    } else {
        AddOutcome::Rejected {
            reason: message.to_string(),
        }
    }
}

/// One downloadable source offered by a manual search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadOption {
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub display_title: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub title: String,
    #[serde(default = "lenient::unknown", deserialize_with = "lenient::text_or_unknown")]
    pub source: String,
    #[serde(rename = "match", default, deserialize_with = "lenient::null_as_default")]
    pub is_match: bool,
    #[serde(default)]
    pub match_issue: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub volume_number: Option<i64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub filesize: u64,
}

impl DownloadOption {
    pub fn label(&self) -> &str {
        [self.display_title.as_str(), self.title.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("Unknown")
    }
}

/// A planned file rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameEntry {
    pub before: String,
    pub after: String,
}

/// Library-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryStats {
    #[serde(default, deserialize_with = "lenient::count")]
    pub volumes: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub issues: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub downloaded_issues: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub monitored: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub unmonitored: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub files: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_file_size: u64,
}

impl LibraryStats {
    /// Share of known issues that have been downloaded, 0-100.
    pub fn completion_percent(&self) -> f64 {
        if self.issues == 0 {
            0.0
        } else {
            self.downloaded_issues as f64 / self.issues as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutInfo {
    #[serde(default = "lenient::unknown", deserialize_with = "lenient::text_or_unknown")]
    pub version: String,
}

impl Default for AboutInfo {
    fn default() -> Self {
        Self {
            version: lenient::unknown(),
        }
    }
}

/// An entry in the library's download queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub volume_id: Option<u64>,
    #[serde(default = "lenient::unknown", deserialize_with = "lenient::text_or_unknown")]
    pub status: String,
    /// Percent complete, 0-100.
    #[serde(default, deserialize_with = "lenient::number")]
    pub progress: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub size: u64,
    /// Bytes per second.
    #[serde(default, deserialize_with = "lenient::number")]
    pub speed: f64,
    #[serde(default = "lenient::unknown", deserialize_with = "lenient::text_or_unknown")]
    pub source_name: String,
    #[serde(default = "lenient::unknown", deserialize_with = "lenient::text_or_unknown")]
    pub source_type: String,
    #[serde(default = "lenient::unknown", deserialize_with = "lenient::text_or_unknown")]
    pub title: String,
    #[serde(default)]
    pub web_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub web_sub_title: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub web_link: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub file: String,
}

impl QueueItem {
    /// Release name shown to users; falls back to the raw download title.
    pub fn release_title(&self) -> &str {
        self.web_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }
}
