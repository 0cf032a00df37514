//! REST client for the library service.
//!
//! Every endpoint lives under `{url}/api`, takes the key as an `api_key` query
//! parameter and wraps its payload in a `{"result": ..., "error": ...}` envelope.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::types::{
    classify_add_failure, AboutInfo, AddOutcome, AddVolumeRequest, DownloadOption,
    LibrarySearchResult, LibraryStats, LibraryVolume, QueueItem, RenameEntry, VolumeFilter,
};
use super::{LibraryClient, LibraryError};
use crate::config::LibraryConfig;
use crate::lenient;
use crate::metrics;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    result: Option<T>,
}

/// Unwrap a `result` envelope from a 200 response. A missing or null
/// `result` decodes to `T::default()`.
pub fn decode_envelope<T>(status: StatusCode, body: &str) -> Result<T, LibraryError>
where
    T: DeserializeOwned + Default,
{
    if status == StatusCode::NOT_FOUND {
        return Err(LibraryError::NotFound(
            error_text(body).unwrap_or_else(|| "HTTP 404".to_string()),
        ));
    }
    if status != StatusCode::OK {
        return Err(LibraryError::Api {
            status: status.as_u16(),
            message: error_text(body).unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        });
    }

    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| LibraryError::Parse(e.to_string()))?;
    Ok(envelope.result.unwrap_or_default())
}

/// The envelope's `error` field, if the body is JSON and carries one.
fn error_text(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Rename previews come back either as `{before: after}` or as a list of
/// `{before, after}` objects depending on the library version.
fn rename_entries(result: Value) -> Vec<RenameEntry> {
    match result {
        Value::Object(map) => map
            .into_iter()
            .map(|(before, after)| RenameEntry {
                before,
                after: after.as_str().map(str::to_string).unwrap_or_default(),
            })
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

pub struct HttpLibraryClient {
    client: Client,
    base_url: String,
    api_key: String,
    root_folder_id: u32,
}

impl HttpLibraryClient {
    pub fn new(config: &LibraryConfig) -> Result<Self, LibraryError> {
        if config.url.trim().is_empty() {
            return Err(LibraryError::NotConfigured(
                "library.url is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            root_folder_id: config.root_folder_id,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Send with the API key attached and return the raw status and body.
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(StatusCode, String), LibraryError> {
        let start = Instant::now();
        let outcome = async {
            let response = request
                .query(&[("api_key", self.api_key.as_str())])
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, LibraryError>((status, body))
        }
        .await;

        let ok = matches!(&outcome, Ok((status, _)) if status.is_success());
        metrics::observe_request("library", operation, ok, start.elapsed());
        if let Err(e) = &outcome {
            debug!("Library {} failed: {}", operation, e);
        }
        outcome
    }

    async fn get_json<T>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LibraryError>
    where
        T: DeserializeOwned + Default,
    {
        let request = self.client.get(self.endpoint(path)).query(query);
        let (status, body) = self.execute(operation, request).await?;
        decode_envelope(status, &body)
    }
}

#[async_trait]
impl LibraryClient for HttpLibraryClient {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LibrarySearchResult>, LibraryError> {
        let mut results: Vec<LibrarySearchResult> = self
            .get_json("search", "/volumes/search", &[("query", query)])
            .await?;
        results.truncate(limit);
        info!("Found {} catalog results for '{}'", results.len(), query);
        Ok(results)
    }

    async fn list_volumes(
        &self,
        filter: Option<VolumeFilter>,
    ) -> Result<Vec<LibraryVolume>, LibraryError> {
        let mut query = vec![("sort", "title")];
        if let Some(filter) = filter {
            query.push(("filter", filter.as_str()));
        }
        let volumes: Vec<LibraryVolume> = self.get_json("list_volumes", "/volumes", &query).await?;
        debug!("Library returned {} volumes (filter: {:?})", volumes.len(), filter);
        Ok(volumes)
    }

    async fn get_volume(&self, volume_id: u64) -> Result<Option<LibraryVolume>, LibraryError> {
        match self
            .get_json::<Option<LibraryVolume>>("get_volume", &format!("/volumes/{}", volume_id), &[])
            .await
        {
            Err(LibraryError::NotFound(_)) => Ok(None),
            other => other,
        }
    }

    async fn add_volume(&self, request: &AddVolumeRequest) -> Result<AddOutcome, LibraryError> {
        let payload = json!({
            "comicvine_id": request.catalog_id,
            "root_folder_id": self.root_folder_id,
            "monitor": true,
            "monitor_new_issues": true,
            "monitoring_scheme": "all",
            "auto_search": true,
            "special_version": "auto",
            "volume_folder": "",
        });

        info!(
            "Adding '{}' (catalog id {}) to library",
            request.title, request.catalog_id
        );

        let builder = self.client.post(self.endpoint("/volumes")).json(&payload);
        let (status, body) = self.execute("add_volume", builder).await?;
        let parsed: Option<Value> = serde_json::from_str(&body).ok();

        if status == StatusCode::CREATED {
            let volume_id = parsed
                .as_ref()
                .and_then(|v| v.pointer("/result/id"))
                .and_then(lenient::value_as_i64)
                .filter(|id| *id > 0);
            return Ok(match volume_id {
                Some(id) => {
                    info!("Added '{}' as library volume {}", request.title, id);
                    AddOutcome::Added {
                        volume_id: id as u64,
                    }
                }
                None => AddOutcome::Rejected {
                    reason: "Failed to retrieve volume ID from response".to_string(),
                },
            });
        }

        let message = match parsed {
            Some(_) => error_text(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            None => format!("Invalid JSON response: {}", body),
        };
        let outcome = classify_add_failure(&message);
        match &outcome {
            AddOutcome::AlreadyExists { .. } => {
                info!("'{}' already exists in library", request.title)
            }
            _ => warn!("Library refused '{}': {}", request.title, message),
        }
        Ok(outcome)
    }

    async fn manual_search(&self, volume_id: u64) -> Result<Vec<DownloadOption>, LibraryError> {
        let options: Vec<DownloadOption> = self
            .get_json(
                "manual_search",
                &format!("/volumes/{}/manualsearch", volume_id),
                &[],
            )
            .await?;
        let matches = options.iter().filter(|o| o.is_match).count();
        info!(
            "Manual search for volume {}: {} options, {} matching",
            volume_id,
            options.len(),
            matches
        );
        Ok(options)
    }

    async fn download(
        &self,
        volume_id: u64,
        link: &str,
        force_match: bool,
    ) -> Result<(), LibraryError> {
        let force = if force_match { "true" } else { "false" };
        let builder = self
            .client
            .post(self.endpoint(&format!("/volumes/{}/download", volume_id)))
            .query(&[("link", link), ("force_match", force)]);
        let (status, body) = self.execute("download", builder).await?;

        if matches!(status.as_u16(), 200 | 201 | 202) {
            info!(
                "Download accepted for volume {} (force_match: {})",
                volume_id, force_match
            );
            return Ok(());
        }

        let message = if serde_json::from_str::<Value>(&body).is_ok() {
            error_text(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        } else {
            format!("Invalid JSON response: {}", body)
        };
        warn!("Download for volume {} refused: {}", volume_id, message);
        Err(LibraryError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn rename_preview(&self, volume_id: u64) -> Result<Vec<RenameEntry>, LibraryError> {
        let result: Value = self
            .get_json("rename_preview", &format!("/volumes/{}/rename", volume_id), &[])
            .await?;
        Ok(rename_entries(result))
    }

    async fn stats(&self) -> Result<LibraryStats, LibraryError> {
        self.get_json("stats", "/volumes/stats", &[]).await
    }

    async fn about(&self) -> Result<AboutInfo, LibraryError> {
        self.get_json("about", "/system/about", &[]).await
    }

    async fn queue(&self) -> Result<Vec<QueueItem>, LibraryError> {
        self.get_json("queue", "/activity/queue", &[]).await
    }

    fn cover_url(&self, volume_id: u64) -> String {
        format!(
            "{}/volumes/{}/cover?api_key={}",
            self.endpoint(""),
            volume_id,
            urlencoding::encode(&self.api_key)
        )
    }
}
