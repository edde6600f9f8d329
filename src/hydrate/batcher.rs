//! Identifier batching
//!
//! Groups identifiers pulled off the discovery queue into batches no larger
//! than the look-up endpoint accepts in one call.

use crate::pipeline::Message;
use crate::{BackscrollError, Result};
use tokio::sync::mpsc;

/// Largest batch the look-up endpoint accepts
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Identifiers to hydrate in one look-up call, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierBatch {
    ids: Vec<String>,
}

impl IdentifierBatch {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Comma separated form sent to the look-up endpoint
    pub fn joined(&self) -> String {
        self.ids.join(",")
    }
}

/// Pulls identifiers off a queue and hands them out in fixed-size batches
pub struct IdentifierBatcher {
    rx: mpsc::Receiver<Message<String>>,
    capacity: usize,
    pending: Vec<String>,
    exhausted: bool,
}

impl IdentifierBatcher {
    pub fn new(rx: mpsc::Receiver<Message<String>>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            rx,
            capacity,
            pending: Vec::with_capacity(capacity),
            exhausted: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Waits for the next batch
    ///
    /// Returns a full batch as soon as `capacity` identifiers have arrived. On
    /// the end-of-stream marker, returns the remaining identifiers as one short
    /// batch if there are any, then `None` from then on. Fails with
    /// [`BackscrollError::UpstreamClosed`] if the queue closes without a marker.
    pub async fn next_batch(&mut self) -> Result<Option<IdentifierBatch>> {
        if self.exhausted {
            return Ok(None);
        }

        loop {
            match self.rx.recv().await {
                Some(Message::Item(id)) => {
                    self.pending.push(id);
                    if self.pending.len() == self.capacity {
                        return Ok(Some(self.take()));
                    }
                }
                Some(Message::End) => {
                    self.exhausted = true;
                    if self.pending.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(self.take()));
                }
                None => return Err(BackscrollError::UpstreamClosed),
            }
        }
    }

    fn take(&mut self) -> IdentifierBatch {
        let ids = std::mem::replace(&mut self.pending, Vec::with_capacity(self.capacity));
        IdentifierBatch::new(ids)
    }
}
