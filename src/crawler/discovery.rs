//! Discovery across a whole search
//!
//! A plain search is one walk. A daily search is one chronological walk per
//! calendar day, oldest day first, so the combined output is ascending end to end.

use crate::crawler::sink::RecordSink;
use crate::crawler::walker::{CursorWalker, EmitOrder, WalkEnd, WalkSummary};
use crate::search::SearchSpec;
use crate::Result;

/// Totals over every walk of one discovery run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoverySummary {
    /// Date ranges walked (1 for a plain search)
    pub ranges: usize,
    pub pages: usize,
    pub records: usize,
    pub filtered: usize,

    /// Discovery ended early because of a stop request or a closed consumer
    pub interrupted: bool,
}

impl DiscoverySummary {
    fn absorb(&mut self, walk: &WalkSummary) {
        self.ranges += 1;
        self.pages += walk.pages;
        self.records += walk.records;
        self.filtered += walk.filtered;
        if matches!(walk.end, WalkEnd::Cancelled | WalkEnd::ConsumerClosed) {
            self.interrupted = true;
        }
    }
}

/// Runs every walk `spec` calls for and feeds all records into `sink`
///
/// The sink is not closed here; the caller decides what completion means for it.
pub async fn discover<S>(
    walker: &CursorWalker,
    spec: &SearchSpec,
    sink: &mut S,
) -> Result<DiscoverySummary>
where
    S: RecordSink + ?Sized,
{
    let mut summary = DiscoverySummary::default();

    if spec.daily {
        for range in spec.date_ranges()? {
            if walker.is_cancelled() {
                summary.interrupted = true;
                break;
            }

            tracing::info!("Searching {}", range);
            let walk = walker
                .walk(spec.request(Some(&range)), EmitOrder::Chronological, sink)
                .await?;
            summary.absorb(&walk);

            if summary.interrupted {
                break;
            }
        }
    } else {
        let order = if spec.chronological {
            EmitOrder::Chronological
        } else {
            EmitOrder::Streaming
        };
        let walk = walker.walk(spec.request(None), order, sink).await?;
        summary.absorb(&walk);
    }

    tracing::info!(
        "Discovery finished: {} ranges, {} pages, {} records",
        summary.ranges,
        summary.pages,
        summary.records
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::test_support::{page, LineParser, ScriptedFetcher};
    use crate::search::{SearchOptions, SearchSpec};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn options() -> SearchOptions {
        SearchOptions {
            hashtags: Some("charlie".to_string()),
            ..Default::default()
        }
    }

    fn walker(fetcher: Arc<ScriptedFetcher>, cancel: CancellationToken) -> CursorWalker {
        CursorWalker::new(fetcher, Arc::new(LineParser), cancel).with_politeness(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_daily_search_is_ascending_across_days() {
        let fetcher = Arc::new(ScriptedFetcher::per_query(vec![
            (
                "#charlie since:2015-01-06 until:2015-01-07".to_string(),
                vec![
                    page(&[("3", 300), ("2", 200)], Some("a1")),
                    page(&[("1", 100)], None),
                ],
            ),
            (
                "#charlie since:2015-01-07 until:2015-01-08".to_string(),
                vec![page(&[("5", 500), ("4", 400)], Some("b1")), page(&[], None)],
            ),
        ]));

        let spec = SearchSpec::parse(options(), Some("2015-01-06"), Some("2015-01-08"), true, false)
            .unwrap();
        let mut out = Vec::new();
        let summary = discover(&walker(fetcher.clone(), CancellationToken::new()), &spec, &mut out)
            .await
            .unwrap();

        let ids: Vec<_> = out.iter().map(|r| r.tweet_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(summary.ranges, 2);
        assert_eq!(summary.pages, 4);
        assert_eq!(summary.records, 5);
        assert!(!summary.interrupted);

        let queries = fetcher.queries();
        assert_eq!(queries.len(), 4);
        assert!(queries[0].ends_with("since:2015-01-06 until:2015-01-07"));
        assert!(queries[3].ends_with("since:2015-01-07 until:2015-01-08"));
    }

    #[tokio::test]
    async fn test_plain_search_streams_newest_first() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            page(&[("3", 300), ("2", 200)], Some("c1")),
            page(&[("1", 100)], None),
        ]));
        let spec = SearchSpec::new(options(), None, None, false, false).unwrap();

        let mut out = Vec::new();
        let summary = discover(&walker(fetcher, CancellationToken::new()), &spec, &mut out)
            .await
            .unwrap();

        let ids: Vec<_> = out.iter().map(|r| r.tweet_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
        assert_eq!(summary.ranges, 1);
    }

    #[tokio::test]
    async fn test_cancelled_daily_search_walks_no_more_days() {
        let fetcher = Arc::new(ScriptedFetcher::endless());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let spec = SearchSpec::parse(options(), Some("2015-01-01"), Some("2015-01-31"), true, false)
            .unwrap();
        let mut out = Vec::new();
        let summary = discover(&walker(fetcher.clone(), cancel), &spec, &mut out)
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.ranges, 0);
        assert!(fetcher.queries().is_empty());
    }
}
