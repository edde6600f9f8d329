//! Hand-off queues between pipeline stages
//!
//! Every queue carries [`Message`]s: domain values wrapped in `Item`, and a
//! single `End` once the producer has finished for good. A queue whose sender
//! disappears without `End` means the producer aborted.

use crate::crawler::{RecordSink, SinkClosed};
use crate::record::CandidateRecord;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One slot on a hand-off queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    Item(T),

    /// No more items will ever be sent on this queue
    End,
}

/// Creates a bounded hand-off queue
pub fn channel<T>(capacity: usize) -> (mpsc::Sender<Message<T>>, mpsc::Receiver<Message<T>>) {
    mpsc::channel(capacity.max(1))
}

/// Forwards candidate records onto a queue, converted by `map`
pub struct ChannelSink<T> {
    tx: mpsc::Sender<Message<T>>,
    map: fn(CandidateRecord) -> T,
}

impl<T> ChannelSink<T> {
    pub fn new(tx: mpsc::Sender<Message<T>>, map: fn(CandidateRecord) -> T) -> Self {
        Self { tx, map }
    }
}

impl ChannelSink<String> {
    /// Forwards only each record's identifier
    pub fn identifiers(tx: mpsc::Sender<Message<String>>) -> Self {
        Self::new(tx, |record| record.tweet_id)
    }
}

impl ChannelSink<CandidateRecord> {
    /// Forwards whole records
    pub fn records(tx: mpsc::Sender<Message<CandidateRecord>>) -> Self {
        Self::new(tx, |record| record)
    }
}

#[async_trait]
impl<T: Send> RecordSink for ChannelSink<T> {
    async fn accept(&mut self, record: CandidateRecord) -> Result<(), SinkClosed> {
        self.tx
            .send(Message::Item((self.map)(record)))
            .await
            .map_err(|_| SinkClosed)
    }

    async fn close(&mut self) {
        if self.tx.send(Message::End).await.is_err() {
            tracing::debug!("Queue consumer gone before end-of-stream marker");
        }
    }
}
