//! Listing page fetcher
//!
//! This module handles the HTTP side of a walk:
//! - Building the HTTP client with a client identity chosen per fetcher
//! - Routing the first request and cursor follow-ups to their endpoints
//! - Tagging each page with the transport encoding it arrived in

use crate::config::{FetcherConfig, IdentityPolicy};
use crate::search::SearchRequest;
use crate::{BackscrollError, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use std::time::Duration;

/// Transport encoding of a fetched listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// Full HTML document (the first page of a search)
    Html,

    /// JSON envelope wrapping an HTML fragment (cursor follow-ups)
    Structured,

    /// Anything else; a walk cannot continue past this
    Other(String),
}

impl ContentKind {
    /// Classifies a `Content-Type` header value
    pub fn from_content_type(content_type: &str) -> Self {
        let lowered = content_type.to_ascii_lowercase();
        if lowered.contains("html") {
            Self::Html
        } else if lowered.contains("json") {
            Self::Structured
        } else {
            Self::Other(content_type.to_string())
        }
    }
}

/// One listing page as it came off the wire
#[derive(Debug, Clone)]
pub struct RawPage {
    pub kind: ContentKind,
    pub body: String,
}

impl RawPage {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Html,
            body: body.into(),
        }
    }

    pub fn structured(body: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Structured,
            body: body.into(),
        }
    }
}

/// Source of listing pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the page addressed by `request` (its cursor, if any, selects the page)
    async fn fetch(&self, request: &SearchRequest) -> Result<RawPage>;
}

/// Picks the client identity string for a new fetcher
pub fn select_identity(config: &FetcherConfig) -> Option<&str> {
    let agents = &config.user_agents;
    if agents.is_empty() {
        return None;
    }

    let index = match config.identity_policy {
        IdentityPolicy::First => 0,
        IdentityPolicy::Random => rand::rng().random_range(0..agents.len()),
    };
    Some(agents[index].as_str())
}

/// Builds an HTTP client presenting the given identity
pub fn build_http_client(user_agent: Option<&str>, timeout: Duration) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }

    builder.build()
}

/// Fetches listing pages over HTTP
///
/// The first page of a search is served as HTML from `search_url`; once a
/// cursor is present, follow-up pages come from `timeline_url` as JSON.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    search_url: String,
    timeline_url: String,
}

impl HttpPageFetcher {
    /// Creates a fetcher with a fresh client whose identity follows the configured policy
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let identity = select_identity(config);
        tracing::debug!("Using client identity: {}", identity.unwrap_or("<default>"));

        let client = build_http_client(identity, Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &FetcherConfig) -> Self {
        Self {
            client,
            search_url: config.search_url.clone(),
            timeline_url: config.timeline_url.clone(),
        }
    }

    fn endpoint_for(&self, request: &SearchRequest) -> &str {
        if request.cursor().is_some() {
            &self.timeline_url
        } else {
            &self.search_url
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, request: &SearchRequest) -> Result<RawPage> {
        let url = self.endpoint_for(request);
        let params: Vec<(&str, &str)> = request.params().collect();

        tracing::trace!("GET {} cursor={:?}", url, request.cursor());

        let response = self
            .client
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|source| BackscrollError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackscrollError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.text().await.map_err(|source| BackscrollError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok(RawPage {
            kind: ContentKind::from_content_type(&content_type),
            body,
        })
    }
}
