use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient;

/// Fields requested from the volume search endpoint.
pub const VOLUME_FIELDS: &str = "id,name,start_year,publisher,issue_count,description,image,deck";

/// Publisher as embedded in a catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPublisher {
    pub id: Option<u64>,
    pub name: String,
}

/// Cover renditions, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    #[serde(default)]
    pub super_url: Option<String>,
    #[serde(default)]
    pub medium_url: Option<String>,
    #[serde(default)]
    pub small_url: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

impl CatalogImage {
    pub fn preferred_url(&self) -> Option<&str> {
        [
            &self.super_url,
            &self.medium_url,
            &self.small_url,
            &self.icon_url,
        ]
        .into_iter()
        .filter_map(|url| url.as_deref())
        .find(|url| !url.trim().is_empty())
    }
}

/// A volume as described by the catalog. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogVolume {
    pub id: u64,
    /// Empty when the catalog sent no name.
    pub name: String,
    pub publisher: Option<CatalogPublisher>,
    pub start_year: Option<i64>,
    pub issue_count: u64,
    pub description: String,
    pub deck: String,
    pub image: Option<CatalogImage>,
}

impl CatalogVolume {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown Title"
        } else {
            &self.name
        }
    }

    pub fn publisher_name(&self) -> &str {
        self.publisher
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("Unknown")
    }

    pub fn publisher_id(&self) -> Option<u64> {
        self.publisher.as_ref().and_then(|p| p.id)
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.image.as_ref().and_then(CatalogImage::preferred_url)
    }

    pub fn catalog_url(&self) -> String {
        catalog_volume_url(self.id)
    }
}

/// Public page for a catalog volume.
pub fn catalog_volume_url(id: u64) -> String {
    format!("https://comicvine.gamespot.com/volume/4050-{}/", id)
}

/// Wire shape of a volume record before defaulting.
#[derive(Debug, Deserialize)]
pub(crate) struct RawVolume {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    name: String,
    #[serde(default)]
    publisher: Value,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    start_year: Option<i64>,
    #[serde(default)]
    issue_count: Value,
    #[serde(default)]
    count_of_issues: Value,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    description: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    deck: String,
    #[serde(default)]
    image: Value,
}

impl RawVolume {
    /// `None` when the record has no usable id.
    pub(crate) fn into_volume(self) -> Option<CatalogVolume> {
        let id = self.id?;
        let publisher = match self.publisher {
            Value::Object(map) => Some(CatalogPublisher {
                id: map
                    .get("id")
                    .and_then(lenient::value_as_i64)
                    .and_then(|n| u64::try_from(n).ok()),
                name: map
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }),
            Value::String(name) => Some(CatalogPublisher { id: None, name }),
            _ => None,
        };
        let issue_count = lenient::value_as_i64(&self.issue_count)
            .or_else(|| lenient::value_as_i64(&self.count_of_issues))
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0);

        Some(CatalogVolume {
            id,
            name: self.name,
            publisher,
            start_year: self.start_year,
            issue_count,
            description: self.description,
            deck: self.deck,
            image: serde_json::from_value(self.image).ok(),
        })
    }
}

/// Inclusive date window on `date_added`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        let end = now.date_naive();
        Self {
            start: end - Duration::days(days as i64),
            end,
        }
    }

    /// `YYYY-MM-DD|YYYY-MM-DD`
    pub fn to_filter(&self) -> String {
        format!(
            "{}|{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// A volume search, newest additions first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeQuery {
    pub publisher_id: Option<u64>,
    pub date_range: DateRange,
    pub limit: u32,
}

impl VolumeQuery {
    pub fn filter_expr(&self) -> String {
        match self.publisher_id {
            Some(id) => format!("publisher:{},date_added:{}", id, self.date_range.to_filter()),
            None => format!("date_added:{}", self.date_range.to_filter()),
        }
    }
}
