//! ComicVine API client.
//!
//! ComicVine wraps every response in `{"error": "OK", "results": ...}` and
//! reports failures through `error` even on HTTP 200. It also rejects
//! requests without a User-Agent.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{CatalogImage, CatalogVolume, RawVolume, VolumeQuery, VOLUME_FIELDS};
use super::{CatalogError, ComicCatalog};
use crate::config::CatalogConfig;
use crate::metrics;

#[derive(Debug, Deserialize)]
struct CatalogEnvelope {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: Value,
}

impl CatalogEnvelope {
    fn into_results(self, status: StatusCode) -> Result<Value, CatalogError> {
        match self.error.as_deref() {
            Some("OK") => Ok(self.results),
            other => Err(CatalogError::Api {
                status: status.as_u16(),
                message: other.unwrap_or("missing status").to_string(),
            }),
        }
    }
}

pub struct ComicVineClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ComicVineClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        if config.api_key.is_empty() {
            return Err(CatalogError::NotConfigured(
                "catalog.api_key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(concat!("longbox/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn fetch(
        &self,
        operation: &'static str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let outcome = async {
            let response = self
                .client
                .get(&url)
                .query(&[("api_key", self.api_key.as_str()), ("format", "json")])
                .query(params)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(CatalogError::RateLimited);
            }
            if status == StatusCode::NOT_FOUND {
                return Err(CatalogError::NotFound(path.to_string()));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CatalogError::Api {
                    status: status.as_u16(),
                    message: body.chars().take(200).collect(),
                });
            }

            let envelope: CatalogEnvelope = response
                .json()
                .await
                .map_err(|e| CatalogError::Parse(e.to_string()))?;
            envelope.into_results(status)
        }
        .await;

        metrics::observe_request("catalog", operation, outcome.is_ok(), start.elapsed());
        outcome
    }
}

#[async_trait]
impl ComicCatalog for ComicVineClient {
    async fn search_volumes(&self, query: &VolumeQuery) -> Result<Vec<CatalogVolume>, CatalogError> {
        let filter = query.filter_expr();
        debug!("Catalog volume search: filter={}", filter);

        let params = [
            ("field_list", VOLUME_FIELDS.to_string()),
            ("filter", filter),
            ("sort", "date_added:desc".to_string()),
            ("limit", query.limit.to_string()),
        ];
        let results = self.fetch("search_volumes", "/volumes/", &params).await?;

        let Value::Array(records) = results else {
            return Err(CatalogError::Parse(
                "volume search results is not a list".to_string(),
            ));
        };

        let total = records.len();
        let volumes: Vec<CatalogVolume> = records
            .into_iter()
            .filter_map(|record| {
                serde_json::from_value::<RawVolume>(record)
                    .ok()
                    .and_then(RawVolume::into_volume)
            })
            .collect();

        if volumes.len() < total {
            debug!(
                "Dropped {} catalog records without a usable id",
                total - volumes.len()
            );
        }
        Ok(volumes)
    }

    async fn cover_url(&self, catalog_id: u64) -> Result<Option<String>, CatalogError> {
        let results = self
            .fetch(
                "cover_url",
                &format!("/volume/4050-{}/", catalog_id),
                &[("field_list", "image".to_string())],
            )
            .await?;

        let image: Option<CatalogImage> = results
            .get("image")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok());
        let url = image
            .as_ref()
            .and_then(CatalogImage::preferred_url)
            .map(str::to_string);

        if url.is_none() {
            debug!("No catalog cover for volume {}", catalog_id);
        }
        Ok(url)
    }

    async fn check_connection(&self) -> bool {
        match self
            .fetch("check_connection", "/volumes/", &[("limit", "1".to_string())])
            .await
        {
            Ok(_) => {
                info!("Catalog connection OK");
                true
            }
            Err(e) => {
                warn!("Catalog connection check failed: {}", e);
                false
            }
        }
    }
}
