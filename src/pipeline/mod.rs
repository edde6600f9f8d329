//! Pipeline module: discovery and hydration running concurrently
//!
//! A pipeline wires two stages together:
//! - Stage A walks the listing and pushes identifiers onto a bounded queue
//! - Stage B batches them, hydrates each batch, and pushes full records onto
//!   a bounded output queue
//!
//! Both queues end with an explicit end-of-stream marker. The consumer reads
//! through a [`CrawlStream`], which surfaces stage failures as errors.

mod queue;
mod stages;
mod stream;

pub use queue::{channel, ChannelSink, Message};
pub use stream::{CrawlStream, StopHandle};

use crate::config::Config;
use crate::crawler::{CursorWalker, PageFetcher, PageParser, DEFAULT_MAX_POLITENESS_DELAY};
use crate::hydrate::{
    BatchLookupClient, HydrationStage, IdentifierBatcher, DEFAULT_BATCH_SIZE,
    DEFAULT_HYDRATION_DELAY,
};
use crate::record::{CandidateRecord, HydratedRecord};
use crate::search::SearchSpec;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default bound of each hand-off queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Tuning knobs of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Identifiers per look-up call
    pub batch_size: usize,

    /// Bound of each hand-off queue
    pub queue_capacity: usize,

    /// Pause before every look-up call
    pub hydration_delay: Duration,

    /// Upper bound of the random pause between listing pages
    pub max_politeness_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            hydration_delay: DEFAULT_HYDRATION_DELAY,
            max_politeness_delay: DEFAULT_MAX_POLITENESS_DELAY,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.lookup.batch_size,
            queue_capacity: config.pipeline.queue_capacity,
            hydration_delay: Duration::from_millis(config.lookup.delay_ms),
            max_politeness_delay: Duration::from_millis(config.fetcher.max_politeness_delay_ms),
        }
    }

    /// Settings with every pause removed
    pub fn immediate() -> Self {
        Self {
            hydration_delay: Duration::ZERO,
            max_politeness_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// A configured, not yet started crawl
///
/// Starting consumes the pipeline and returns the stream of its output. The
/// stop signal is shared, so a [`StopHandle`] taken before starting stops the
/// run it leads to.
pub struct CrawlPipeline {
    spec: SearchSpec,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn PageParser>,
    settings: PipelineSettings,
    cancel: CancellationToken,
}

impl CrawlPipeline {
    /// Creates a pipeline for `spec`
    ///
    /// # Errors
    ///
    /// Fails with [`crate::BackscrollError::InvalidDateRange`] when the date
    /// bounds of `spec` describe an empty range.
    pub fn new(
        spec: SearchSpec,
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn PageParser>,
        settings: PipelineSettings,
    ) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            fetcher,
            parser,
            settings,
            cancel: CancellationToken::new(),
        })
    }

    pub fn spec(&self) -> &SearchSpec {
        &self.spec
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.cancel.clone())
    }

    /// Requests a graceful stop; see [`StopHandle`]
    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    /// Starts discovery and hydration and returns the hydrated records
    ///
    /// Records come out sorted by creation time within each look-up batch.
    pub fn run(self, lookup: Arc<dyn BatchLookupClient>) -> CrawlStream<HydratedRecord> {
        let (id_tx, id_rx) = channel::<String>(self.settings.queue_capacity);
        let (out_tx, out_rx) = channel::<HydratedRecord>(self.settings.queue_capacity);

        let walker = self.walker();
        let batcher = IdentifierBatcher::new(id_rx, self.settings.batch_size);
        let stage = HydrationStage::new(lookup).with_delay(self.settings.hydration_delay);

        tracing::info!(
            "Starting pipeline (batch size {}, queue capacity {})",
            batcher.capacity(),
            self.settings.queue_capacity
        );

        let discovery = tokio::spawn(stages::run_discovery(
            walker,
            self.spec.clone(),
            ChannelSink::identifiers(id_tx),
            self.cancel.clone(),
        ));
        let hydration = tokio::spawn(stages::run_hydration(
            batcher,
            stage,
            out_tx,
            self.cancel.clone(),
        ));

        CrawlStream::new(
            out_rx,
            vec![("discovery", discovery), ("hydration", hydration)],
            self.cancel.clone(),
        )
    }

    /// Starts discovery alone and returns the candidate records as parsed
    /// from the listing
    pub fn run_unhydrated(self) -> CrawlStream<CandidateRecord> {
        let (tx, rx) = channel::<CandidateRecord>(self.settings.queue_capacity);

        let discovery = tokio::spawn(stages::run_discovery(
            self.walker(),
            self.spec.clone(),
            ChannelSink::records(tx),
            self.cancel.clone(),
        ));

        CrawlStream::new(rx, vec![("discovery", discovery)], self.cancel.clone())
    }

    fn walker(&self) -> CursorWalker {
        CursorWalker::new(self.fetcher.clone(), self.parser.clone(), self.cancel.clone())
            .with_politeness(self.settings.max_politeness_delay)
            .with_cutoffs(self.spec.cutoffs())
    }
}
