use crate::hydrate::batcher::IdentifierBatch;
use crate::hydrate::lookup::BatchLookupClient;
use crate::record::HydratedRecord;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Courtesy pause before every look-up call
pub const DEFAULT_HYDRATION_DELAY: Duration = Duration::from_secs(4);

/// Hydrates identifier batches one call at a time
#[derive(Clone)]
pub struct HydrationStage {
    client: Arc<dyn BatchLookupClient>,
    delay: Duration,
}

impl HydrationStage {
    pub fn new(client: Arc<dyn BatchLookupClient>) -> Self {
        Self {
            client,
            delay: DEFAULT_HYDRATION_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Waits the courtesy delay, looks the batch up, and sorts the result
    /// ascending by authoritative creation time
    ///
    /// Order is only restored within the batch; a later batch may hold older posts.
    pub async fn hydrate(&self, batch: &IdentifierBatch) -> Result<Vec<HydratedRecord>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut records = self.client.post(batch.ids()).await?;
        records.sort_by_key(|record| record.created_at);

        tracing::debug!(
            "Hydrated batch of {} identifiers into {} records",
            batch.len(),
            records.len()
        );
        Ok(records)
    }
}
