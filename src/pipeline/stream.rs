//! Consumer side of a running pipeline

use crate::pipeline::queue::Message;
use crate::{BackscrollError, Result};
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Requests a graceful stop of a running pipeline from anywhere
///
/// Stopping is advisory: discovery finishes the page it is on, hydration
/// finishes the batch it is on, and both then emit their end-of-stream
/// markers so the consumer still sees a clean end.
#[derive(Debug, Clone)]
pub struct StopHandle {
    cancel: CancellationToken,
}

impl StopHandle {
    pub(crate) fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Stop requested, finishing in-flight work");
        }
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A stage task and the name it is reported under
pub(crate) type StageTask = (&'static str, JoinHandle<Result<()>>);

/// Records coming out of a running pipeline
///
/// `next` yields records until the final stage's end-of-stream marker, then
/// joins every stage and reports the first stage failure, if any. Dropping
/// the stream before the end stops the pipeline.
pub struct CrawlStream<T> {
    rx: mpsc::Receiver<Message<T>>,
    stages: Vec<StageTask>,
    cancel: CancellationToken,
    finished: bool,
    emitted: usize,
}

impl<T: Send + 'static> CrawlStream<T> {
    pub(crate) fn new(
        rx: mpsc::Receiver<Message<T>>,
        stages: Vec<StageTask>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            rx,
            stages,
            cancel,
            finished: false,
            emitted: 0,
        }
    }

    /// Waits for the next record
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - The next record
    /// * `Ok(None)` - The pipeline finished cleanly (possibly after a stop)
    /// * `Err(_)` - A stage failed; the error of the earliest failed stage
    pub async fn next(&mut self) -> Result<Option<T>> {
        if self.finished {
            return Ok(None);
        }

        match self.rx.recv().await {
            Some(Message::Item(item)) => {
                self.emitted += 1;
                Ok(Some(item))
            }
            Some(Message::End) => {
                self.finished = true;
                self.join_stages().await?;
                tracing::info!("Pipeline finished after {} records", self.emitted);
                Ok(None)
            }
            None => {
                // A stage aborted; the others must not keep working
                self.cancel.cancel();
                self.finished = true;
                self.join_stages().await?;
                Err(BackscrollError::Aborted)
            }
        }
    }

    /// Drains the stream into a vector
    pub async fn collect(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.cancel.clone())
    }

    /// Number of records handed out so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Adapts this stream into a [`futures::Stream`] that ends after the
    /// first error
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut stream = state?;
            match stream.next().await {
                Ok(Some(item)) => Some((Ok(item), Some(stream))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    async fn join_stages(&mut self) -> Result<()> {
        let mut first_error = None;

        for (name, handle) in self.stages.drain(..) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(BackscrollError::StageFailed(format!("{} stage: {}", name, e))),
            };

            if let Err(e) = outcome {
                tracing::debug!("{} stage ended with error: {}", name, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<T> Drop for CrawlStream<T> {
    fn drop(&mut self) {
        if !self.finished {
            self.cancel.cancel();
        }
    }
}
