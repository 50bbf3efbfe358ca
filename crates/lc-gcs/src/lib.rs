//! Google Cloud Storage sources for logcomb.
//!
//! Lists and streams objects from publicly readable buckets through the
//! Cloud Storage JSON API. Requests are unauthenticated.

use std::io;
use std::pin::Pin;
use std::time::Duration;

use futures::TryStreamExt;
use lc_core::{Discovery, SourceReader, is_log_name};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio_util::io::StreamReader;

/// Public Cloud Storage endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Connect timeout only; object bodies may take arbitrarily long to stream.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Only object names are needed from listings.
const LIST_FIELDS: &str = "items(name),nextPageToken";

/// Storage client errors.
#[derive(Debug, Error)]
pub enum GcsError {
    /// The configured endpoint is not a usable base URL.
    #[error("invalid storage endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("storage API error (status {status}): {message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Streamed body of one object.
pub type ObjectStream = Pin<Box<dyn AsyncBufRead + Send>>;

/// Cloud Storage JSON API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
}

impl Client {
    /// Creates a client for the given API endpoint.
    pub fn new(endpoint: &str) -> Result<Self, GcsError> {
        let invalid = |reason: String| GcsError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let parsed = Url::parse(endpoint).map_err(|err| invalid(err.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(GcsError::ClientBuild)?;

        Ok(Self {
            http,
            endpoint: parsed,
        })
    }

    /// Appends percent-encoded path segments to the endpoint.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        // `new` rejects endpoints that cannot be a base, so this always applies.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn objects_url(&self, bucket: &str) -> Url {
        self.api_url(&["storage", "v1", "b", bucket, "o"])
    }

    fn media_url(&self, bucket: &str, name: &str) -> Url {
        let mut url = self.api_url(&["storage", "v1", "b", bucket, "o", name]);
        url.query_pairs_mut().append_pair("alt", "media");
        url
    }

    /// Lists every object name under `prefix`, following pagination.
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, GcsError> {
        let url = self.objects_url(bucket);
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(url.clone())
                .query(&[("prefix", prefix), ("fields", LIST_FIELDS)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(api_error(status.as_u16(), &body));
            }

            let page: ObjectList = serde_json::from_str(&body)
                .map_err(|err| GcsError::InvalidResponse(err.to_string()))?;
            names.extend(page.items.into_iter().map(|item| item.name));
            tracing::debug!(bucket, prefix, listed = names.len(), "listed object page");

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(names)
    }

    /// Lists the log objects under `prefix` in the API's lexical order.
    pub async fn discover(&self, bucket: &str, prefix: &str) -> Result<Discovery, GcsError> {
        let names: Vec<String> = self
            .list_objects(bucket, prefix)
            .await?
            .into_iter()
            .filter(|name| is_log_name(name))
            .collect();

        tracing::info!(bucket, prefix, sources = names.len(), "discovered bucket sources");

        Ok(Discovery {
            prefix: prefix.to_string(),
            names,
        })
    }

    /// Opens a streamed reader over one object's contents.
    pub async fn open_object(&self, bucket: &str, name: &str) -> Result<ObjectStream, GcsError> {
        let response = self.http.get(self.media_url(bucket, name)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let body = response.bytes_stream().map_err(io::Error::other);
        Ok(Box::pin(StreamReader::new(body)))
    }
}

/// Opens sources as objects of one bucket.
#[derive(Debug, Clone)]
pub struct BucketReader {
    client: Client,
    bucket: String,
}

impl BucketReader {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

impl SourceReader for BucketReader {
    type Stream = ObjectStream;
    type Error = GcsError;

    async fn open(&self, name: &str) -> Result<Self::Stream, Self::Error> {
        self.client.open_object(&self.bucket, name).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

fn api_error(status: u16, body: &str) -> GcsError {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    let message = serde_json::from_str::<ErrorPayload>(body)
        .map(|payload| payload.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    GcsError::Api { status, message }
}
