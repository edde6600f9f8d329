//! Backscroll: historical post retrieval over a cursor-paginated search listing
//!
//! This crate walks a newest-first search listing page by page, optionally
//! splits the query into daily ranges so the oldest posts come first, and
//! re-hydrates every discovered identifier through a batched look-up endpoint.
//! Discovery and hydration run as two concurrent stages joined by bounded queues.

pub mod config;
pub mod crawler;
pub mod hydrate;
pub mod pipeline;
pub mod record;
pub mod search;

use thiserror::Error;

/// Main error type for Backscroll operations
#[derive(Debug, Error)]
pub enum BackscrollError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(#[from] DateError),

    #[error("Unexpected content type '{content_type}': expected HTML or JSON")]
    TransportShape { content_type: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Batch look-up failed with status {status}: {message}")]
    BatchCall { status: u16, message: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pipeline stage failed: {0}")]
    StageFailed(String),

    #[error("Upstream queue closed before its end-of-stream marker")]
    UpstreamClosed,

    #[error("Pipeline output closed before its end-of-stream marker")]
    Aborted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Credentials profile '{0}' not found")]
    MissingProfile(String),
}

/// Date and date-range errors, all raised before any network activity
#[derive(Debug, Error)]
pub enum DateError {
    #[error("Failed to parse date '{0}': expected YYYY-MM-DD[ HH:MM[:SS]]")]
    Parse(String),

    #[error("since ({since}) must be earlier than until ({until})")]
    EmptyRange {
        since: chrono::NaiveDate,
        until: chrono::NaiveDate,
    },

    #[error("Range granularity must be at least one day")]
    ZeroGranularity,
}

/// Result type alias for Backscroll operations
pub type Result<T> = std::result::Result<T, BackscrollError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for date operations
pub type DateResult<T> = std::result::Result<T, DateError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CursorWalker, DateRange, DateRanges, EmitOrder};
pub use pipeline::{CrawlPipeline, CrawlStream, StopHandle};
pub use record::{CandidateRecord, HydratedRecord};
pub use search::{SearchOptions, SearchRequest, SearchSpec};
