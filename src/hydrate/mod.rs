//! Hydrate module: identifier batching and batched look-ups
//!
//! This module contains the second pipeline stage's building blocks:
//! - Batching identifiers off the discovery queue
//! - The batched look-up client interface and its HTTP implementation
//! - The hydration stage that paces calls and orders each batch

mod batcher;
mod lookup;
mod stage;

pub use batcher::{IdentifierBatch, IdentifierBatcher, DEFAULT_BATCH_SIZE};
pub use lookup::{BatchLookupClient, HttpLookupClient};
pub use stage::{HydrationStage, DEFAULT_HYDRATION_DELAY};
