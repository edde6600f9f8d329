//! Record consumers
//!
//! Walks push their output into a [`RecordSink`]. A sink is ready to receive as
//! soon as it is constructed.

use crate::record::CandidateRecord;
use async_trait::async_trait;
use thiserror::Error;

/// The consumer behind a sink has gone away; producing more is pointless
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("record consumer closed")]
pub struct SinkClosed;

/// Receives candidate records from a walk
#[async_trait]
pub trait RecordSink: Send {
    /// Accepts one record, waiting if the consumer applies back-pressure
    async fn accept(&mut self, record: CandidateRecord) -> Result<(), SinkClosed>;

    /// Signals that no more records will ever be accepted
    async fn close(&mut self) {}
}

#[async_trait]
impl RecordSink for Vec<CandidateRecord> {
    async fn accept(&mut self, record: CandidateRecord) -> Result<(), SinkClosed> {
        self.push(record);
        Ok(())
    }
}
