//! Cursor walker - drives one search listing to exhaustion
//!
//! A walk repeats fetch → parse → emit, writing each page's cursor back into
//! the request before the next fetch. It ends when:
//! - a page parses to zero records (end of results)
//! - a non-empty page carries no cursor
//! - cancellation is observed at a page boundary
//! - the consumer stops accepting records
//!
//! Pages arrive newest first. In [`EmitOrder::Chronological`] mode the walk
//! buffers everything and emits it sorted ascending by creation time.

use crate::crawler::fetcher::{ContentKind, PageFetcher};
use crate::crawler::parser::PageParser;
use crate::crawler::sink::RecordSink;
use crate::search::{Cutoffs, SearchRequest};
use crate::{BackscrollError, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Upper bound of the randomized pause between page fetches
pub const DEFAULT_MAX_POLITENESS_DELAY: Duration = Duration::from_secs(1);

/// How a walk hands its records to the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOrder {
    /// Each page as soon as it is parsed (newest first overall)
    Streaming,

    /// Everything at the end, ascending by creation time
    Chronological,
}

/// Why a walk stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WalkEnd {
    /// A page with no records
    #[default]
    Exhausted,

    /// A non-empty page without a next cursor
    NoCursor,

    /// Stop was requested
    Cancelled,

    /// The sink refused further records
    ConsumerClosed,
}

/// Counters for one finished walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages: usize,
    pub records: usize,

    /// Records dropped by the exact-time cutoffs
    pub filtered: usize,

    pub end: WalkEnd,
}

/// Walks a cursor-paginated listing page by page
#[derive(Clone)]
pub struct CursorWalker {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn PageParser>,
    cancel: CancellationToken,
    max_delay: Duration,
    cutoffs: Cutoffs,
}

impl CursorWalker {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn PageParser>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            parser,
            cancel,
            max_delay: DEFAULT_MAX_POLITENESS_DELAY,
            cutoffs: Cutoffs::default(),
        }
    }

    /// Sets the upper bound of the random pause between pages
    pub fn with_politeness(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Sets exact-time bounds checked against every record
    pub fn with_cutoffs(mut self, cutoffs: Cutoffs) -> Self {
        self.cutoffs = cutoffs;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Walks the listing addressed by `request` and feeds its records to `sink`
    ///
    /// The request must not carry a cursor; the walk writes cursors itself.
    /// A page whose content kind is neither HTML nor JSON aborts the walk with
    /// [`BackscrollError::TransportShape`]. Fetch and parse failures are not
    /// retried.
    pub async fn walk<S>(
        &self,
        mut request: SearchRequest,
        order: EmitOrder,
        sink: &mut S,
    ) -> Result<WalkSummary>
    where
        S: RecordSink + ?Sized,
    {
        let mut summary = WalkSummary::default();
        let mut buffered = Vec::new();

        tracing::debug!("Starting walk for query {:?}", request.query());

        summary.end = loop {
            let page = self.fetcher.fetch(&request).await?;
            if let ContentKind::Other(content_type) = &page.kind {
                tracing::error!("{} is not a valid HTML or JSON response", content_type);
                return Err(BackscrollError::TransportShape {
                    content_type: content_type.clone(),
                });
            }

            let parsed = self.parser.parse(&page)?;
            summary.pages += 1;
            tracing::debug!(
                "Page {}: {} records, next cursor {:?}",
                summary.pages,
                parsed.records.len(),
                parsed.next_cursor
            );

            if parsed.records.is_empty() {
                break WalkEnd::Exhausted;
            }

            for record in parsed.records {
                if !self.cutoffs.admits(record.created_at) {
                    summary.filtered += 1;
                    continue;
                }
                summary.records += 1;

                match order {
                    EmitOrder::Streaming => {
                        if sink.accept(record).await.is_err() {
                            summary.end = WalkEnd::ConsumerClosed;
                            return Ok(summary);
                        }
                    }
                    EmitOrder::Chronological => buffered.push(record),
                }
            }

            if self.cancel.is_cancelled() {
                tracing::info!("Stop requested, ending walk after page {}", summary.pages);
                break WalkEnd::Cancelled;
            }

            let Some(cursor) = parsed.next_cursor else {
                break WalkEnd::NoCursor;
            };
            request.set_cursor(cursor);

            if self.pause().await {
                tracing::info!("Stop requested during politeness delay");
                break WalkEnd::Cancelled;
            }
        };

        if order == EmitOrder::Chronological {
            buffered.sort_by_key(|record| record.created_at);
            for record in buffered {
                if sink.accept(record).await.is_err() {
                    summary.end = WalkEnd::ConsumerClosed;
                    break;
                }
            }
        }

        tracing::debug!(
            "Walk finished ({:?}): {} pages, {} records, {} outside cutoffs",
            summary.end,
            summary.pages,
            summary.records,
            summary.filtered
        );

        Ok(summary)
    }

    /// Sleeps a random time in `[0, max_delay]`; returns true if cancelled meanwhile
    async fn pause(&self) -> bool {
        let delay = jitter(self.max_delay);
        tokio::select! {
            _ = self.cancel.cancelled() => true,
            _ = tokio::time::sleep(delay) => false,
        }
    }
}

fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}
