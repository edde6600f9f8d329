//! The two stage tasks a pipeline spawns

use crate::crawler::{discover, CursorWalker, RecordSink};
use crate::hydrate::{HydrationStage, IdentifierBatcher};
use crate::pipeline::queue::{ChannelSink, Message};
use crate::record::HydratedRecord;
use crate::search::SearchSpec;
use crate::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Stage A: discovers records into `sink`, then marks the queue finished
///
/// On failure the marker is withheld, so the downstream side sees an abort
/// rather than a clean end, and the whole run is cancelled.
pub(crate) async fn run_discovery<T: Send>(
    walker: CursorWalker,
    spec: SearchSpec,
    mut sink: ChannelSink<T>,
    cancel: CancellationToken,
) -> Result<()> {
    match discover(&walker, &spec, &mut sink).await {
        Ok(summary) => {
            if summary.interrupted {
                tracing::info!("Discovery interrupted after {} records", summary.records);
            }
            sink.close().await;
            Ok(())
        }
        Err(e) => {
            tracing::error!("Discovery failed: {}", e);
            cancel.cancel();
            Err(e)
        }
    }
}

/// Stage B: batches identifiers, hydrates each batch, forwards the records
///
/// Once a stop is requested no further batch is looked up; the stage sends
/// its end marker and returns. A consumer that went away ends the stage
/// quietly. A failure cancels the run so discovery stops at its next page.
pub(crate) async fn run_hydration(
    mut batcher: IdentifierBatcher,
    stage: HydrationStage,
    out: mpsc::Sender<Message<HydratedRecord>>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut batches = 0usize;
    let mut records = 0usize;

    loop {
        let batch = match batcher.next_batch().await {
            Ok(Some(batch)) => batch,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Hydration lost its input: {}", e);
                cancel.cancel();
                return Err(e);
            }
        };

        if cancel.is_cancelled() {
            tracing::info!("Skipping remaining hydration after stop");
            break;
        }

        let hydrated = match stage.hydrate(&batch).await {
            Ok(hydrated) => hydrated,
            Err(e) => {
                tracing::error!("Hydration of {} identifiers failed: {}", batch.len(), e);
                cancel.cancel();
                return Err(e);
            }
        };
        batches += 1;

        for record in hydrated {
            if out.send(Message::Item(record)).await.is_err() {
                tracing::debug!("Consumer gone, ending hydration");
                return Ok(());
            }
            records += 1;
        }
    }

    // Release discovery before waiting on the consumer
    drop(batcher);

    if out.send(Message::End).await.is_err() {
        tracing::debug!("Consumer gone before end-of-stream marker");
    }

    tracing::info!(
        "Hydration finished: {} batches, {} records",
        batches,
        records
    );
    Ok(())
}
