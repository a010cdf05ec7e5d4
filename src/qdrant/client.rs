//! HTTP client for the Qdrant points API.
//!
//! Issues a health probe followed by either a vector search (when a query
//! vector is supplied) or a payload scroll, and returns the raw hits.

use crate::models::RawHit;
use crate::qdrant::error::{QdrantError, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for [`QdrantClient`].
#[derive(Debug, Clone)]
pub struct QdrantClientConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for QdrantClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            timeout_seconds: 30,
        }
    }
}

/// `points/search` request body.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

/// `points/scroll` request body.
#[derive(Debug, Serialize)]
struct ScrollRequest {
    limit: usize,
    with_payload: bool,
    with_vector: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

/// Parse hits from a bare JSON array or a search/scroll response body.
///
/// The document shape is picked first so that a bad field inside a hit
/// reports the field-level error.
pub fn parse_hits(content: &str) -> Result<Vec<RawHit>> {
    let document: Value = serde_json::from_str(content)
        .map_err(|e| QdrantError::InvalidResponse(e.to_string()))?;

    let hits = match document {
        Value::Array(hits) => Value::Array(hits),
        Value::Object(mut object) => match object.remove("result") {
            Some(result @ Value::Array(_)) => result,
            Some(Value::Object(mut result)) => result.remove("points").ok_or_else(|| {
                QdrantError::InvalidResponse("`result` object has no `points` array".to_string())
            })?,
            _ => {
                return Err(QdrantError::InvalidResponse(
                    "expected a hits array or a `result` field".to_string(),
                ))
            }
        },
        _ => {
            return Err(QdrantError::InvalidResponse(
                "expected a hits array or a response object".to_string(),
            ))
        }
    };

    serde_json::from_value::<Vec<RawHit>>(hits)
        .map_err(|e| QdrantError::InvalidResponse(e.to_string()))
}

/// Build an exact-match filter on the `filePath` payload key.
fn file_filter(file_path: Option<&str>) -> Option<Value> {
    file_path.map(|path| {
        json!({
            "must": [
                { "key": "filePath", "match": { "value": path } }
            ]
        })
    })
}

/// Client for a single Qdrant instance.
pub struct QdrantClient {
    config: QdrantClientConfig,
    http_client: reqwest::Client,
}

impl QdrantClient {
    /// Create a client. Fails on a malformed URL.
    pub fn new(mut config: QdrantClientConfig) -> Result<Self> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(QdrantError::InvalidUrl(config.url));
        }
        config.url = config.url.trim_end_matches('/').to_string();

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Base URL with any trailing slash removed.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Probe `GET /healthz`.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/healthz", self.config.url);
        debug!("Qdrant health check: {}", url);

        let response = self
            .with_auth(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(QdrantError::Unhealthy(response.status().as_u16()));
        }

        Ok(())
    }

    /// Nearest-neighbour search with a query vector.
    pub async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        file_path: Option<&str>,
    ) -> Result<Vec<RawHit>> {
        let url = format!("{}/collections/{}/points/search", self.config.url, collection);
        let request = SearchRequest {
            vector,
            limit,
            with_payload: true,
            filter: file_filter(file_path),
        };

        debug!("Searching {} (limit {}, dim {})", collection, limit, vector.len());
        let body = self.post(&url, &request).await?;
        let hits = parse_hits(&body)?;

        info!("Search returned {} hits", hits.len());
        Ok(hits)
    }

    /// Page through stored points without a query vector.
    pub async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        file_path: Option<&str>,
    ) -> Result<Vec<RawHit>> {
        let url = format!("{}/collections/{}/points/scroll", self.config.url, collection);
        let request = ScrollRequest {
            limit,
            with_payload: true,
            with_vector: false,
            filter: file_filter(file_path),
        };

        debug!("Scrolling {} (limit {})", collection, limit);
        let body = self.post(&url, &request).await?;
        let hits = parse_hits(&body)?;

        info!("Scroll returned {} points", hits.len());
        Ok(hits)
    }

    /// Health check, then search when a vector is given, otherwise scroll.
    pub async fn query(
        &self,
        collection: &str,
        vector: Option<&[f32]>,
        limit: usize,
        file_path: Option<&str>,
    ) -> Result<Vec<RawHit>> {
        self.health_check().await?;

        match vector {
            Some(vector) => self.search(collection, vector, limit, file_path).await,
            None => self.scroll(collection, limit, file_path).await,
        }
    }

    async fn post<T: Serialize>(&self, url: &str, request: &T) -> Result<String> {
        let response = self
            .with_auth(self.http_client.post(url))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(QdrantError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key {
            Some(ref key) => request.header("api-key", key),
            None => request,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> QdrantError {
        if e.is_timeout() {
            QdrantError::Timeout(self.config.timeout_seconds)
        } else if e.is_connect() {
            QdrantError::Connection(self.config.url.clone())
        } else {
            QdrantError::Http(e)
        }
    }
}
