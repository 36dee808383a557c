//! Paperless-ngx HTTP client implementation.
//!
//! This module provides `PaperlessClient` for making synchronous HTTP requests to the
//! Paperless-ngx API, along with the error type, the builder used to configure it and
//! the `PaperlessApi` trait the rest of the crate programs against.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::blocking::Response;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::normalize_base_url;
use crate::models::{DocumentId, DocumentPage, Page, Tag, TagId};

/// Page size used when walking the tag list.
const TAG_PAGE_SIZE: u32 = 100;

/// Longest response body kept in an HTTP error.
const MAX_ERROR_BODY: usize = 200;

/// Errors that can occur when talking to the Paperless-ngx API.
#[derive(Debug, Error)]
pub enum PaperlessError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Non-success HTTP status, with the start of the response body
    #[error("HTTP error: status {status}: {body}")]
    Http { status: u16, body: String },

    /// JSON deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The API token is missing or can't be sent as a header
    #[error("Invalid API token: {0}")]
    InvalidToken(String),
}

fn transport_error(error: reqwest::Error) -> PaperlessError {
    if error.is_timeout() {
        PaperlessError::Timeout(error)
    } else {
        PaperlessError::Network(error)
    }
}

/// Parameters for a documents-by-tag query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentQuery {
    /// Number of documents to return in the single requested page.
    pub page_size: u32,
    /// Order results by descending creation time.
    pub newest_first: bool,
}

impl DocumentQuery {
    /// Query that only reads the total `count` of matching documents.
    pub fn count_only() -> Self {
        Self {
            page_size: 1,
            newest_first: false,
        }
    }

    /// Query returning only the most recently created matching document.
    pub fn most_recent() -> Self {
        Self {
            page_size: 1,
            newest_first: true,
        }
    }

    /// Query returning the first `page_size` matching documents.
    pub fn first_page(page_size: u32) -> Self {
        Self {
            page_size,
            newest_first: false,
        }
    }
}

/// Operations the advisor needs from the document system.
///
/// This trait enables fakes in tests and keeps the grouping, usage and
/// consolidation logic independent of HTTP.
pub trait PaperlessApi: Send + Sync {
    /// Fetches every tag, in the order the server lists them.
    fn list_tags(&self) -> Result<Vec<Tag>, PaperlessError>;

    /// Fetches a single page of documents carrying `tag`.
    fn documents_with_tag(
        &self,
        tag: TagId,
        query: DocumentQuery,
    ) -> Result<DocumentPage, PaperlessError>;

    /// Replaces the tag set of `document` with `tags`.
    fn update_document_tags(
        &self,
        document: DocumentId,
        tags: &[TagId],
    ) -> Result<(), PaperlessError>;

    /// Deletes `tag` from the document system.
    fn delete_tag(&self, tag: TagId) -> Result<(), PaperlessError>;
}

/// Builder for constructing `PaperlessClient` instances.
///
/// # Examples
///
/// ```
/// use tagdedup::paperless::PaperlessClientBuilder;
///
/// let client = PaperlessClientBuilder::new()
///     .base_url("http://localhost:8000/api")
///     .token("secret")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.base_url(), "http://localhost:8000");
/// ```
#[derive(Debug, Default)]
pub struct PaperlessClientBuilder {
    base_url: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
}

impl PaperlessClientBuilder {
    /// Creates a new `PaperlessClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server URL. A trailing `/api` or `/` is dropped.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API token sent as `Authorization: Token <token>`.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the per-request timeout. Defaults to 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `PaperlessClient` with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns `PaperlessError::InvalidUrl` if no URL was given or it doesn't parse,
    /// and `PaperlessError::InvalidToken` if the token is missing or not a valid
    /// header value.
    pub fn build(self) -> Result<PaperlessClient, PaperlessError> {
        let base_url = self
            .base_url
            .map(|url| normalize_base_url(&url))
            .ok_or_else(|| PaperlessError::InvalidUrl("no base URL configured".to_string()))?;

        reqwest::Url::parse(&base_url)
            .map_err(|e| PaperlessError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PaperlessError::InvalidToken("no token configured".to_string()))?;

        let mut auth = HeaderValue::from_str(&format!("Token {}", token.trim()))
            .map_err(|e| PaperlessError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(PaperlessError::Network)?;

        Ok(PaperlessClient { client, base_url })
    }
}

/// Synchronous HTTP client for the Paperless-ngx API.
///
/// Requests are issued one at a time and never retried. Construct it with
/// `PaperlessClientBuilder`.
pub struct PaperlessClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl PaperlessClient {
    /// Returns the base URL configured for this client, without the `/api` suffix.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<T, PaperlessError> {
        let response = request.send().map_err(transport_error)?;
        let body = ensure_success(response)?.text().map_err(transport_error)?;
        serde_json::from_str(&body).map_err(PaperlessError::Serialization)
    }
}

/// Turns a non-2xx response into `PaperlessError::Http`.
fn ensure_success(response: Response) -> Result<Response, PaperlessError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(PaperlessError::Http {
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Follows `next` links from `first` and concatenates the results.
///
/// Stops at the last page, or at a link to a page already fetched.
fn collect_pages<T>(
    first: String,
    mut fetch: impl FnMut(&str) -> Result<Page<T>, PaperlessError>,
) -> Result<Vec<T>, PaperlessError> {
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut url = first;

    loop {
        let page = fetch(&url)?;
        items.extend(page.results);
        visited.insert(url);

        match page.next {
            None => break,
            Some(next) if visited.contains(&next) => {
                warn!(%next, "pagination links back to a fetched page; stopping");
                break;
            }
            Some(next) => url = next,
        }
    }

    Ok(items)
}

impl PaperlessApi for PaperlessClient {
    fn list_tags(&self) -> Result<Vec<Tag>, PaperlessError> {
        let first = format!("{}?page_size={}", self.endpoint("/tags/"), TAG_PAGE_SIZE);
        collect_pages(first, |url| {
            debug!(%url, "fetching tag page");
            self.get_json(self.client.get(url))
        })
    }

    fn documents_with_tag(
        &self,
        tag: TagId,
        query: DocumentQuery,
    ) -> Result<DocumentPage, PaperlessError> {
        let mut params = vec![
            ("tags__id", tag.to_string()),
            ("page_size", query.page_size.to_string()),
            ("fields", "id,created,tags".to_string()),
        ];
        if query.newest_first {
            params.push(("ordering", "-created".to_string()));
        }

        debug!(tag = %tag, ?query, "querying documents by tag");
        let request = self.client.get(self.endpoint("/documents/")).query(&params);
        self.get_json(request)
    }

    fn update_document_tags(
        &self,
        document: DocumentId,
        tags: &[TagId],
    ) -> Result<(), PaperlessError> {
        let url = self.endpoint(&format!("/documents/{}/", document));
        debug!(document = %document, ?tags, "updating document tags");

        let response = self
            .client
            .patch(&url)
            .json(&serde_json::json!({ "tags": tags }))
            .send()
            .map_err(transport_error)?;
        ensure_success(response)?;
        Ok(())
    }

    fn delete_tag(&self, tag: TagId) -> Result<(), PaperlessError> {
        let url = self.endpoint(&format!("/tags/{}/", tag));
        debug!(tag = %tag, "deleting tag");

        let response = self.client.delete(&url).send().map_err(transport_error)?;
        ensure_success(response)?;
        Ok(())
    }
}
