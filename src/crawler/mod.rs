//! Crawler module: identifier discovery
//!
//! This module contains the discovery side of the pipeline, including:
//! - Listing page fetching and transport classification
//! - Page parsing into candidate records and cursors
//! - The cursor walk over one listing
//! - Splitting a search interval into daily ranges
//! - Discovery across ranges, the first pipeline stage

mod discovery;
mod fetcher;
mod parser;
mod sink;
mod splitter;
mod walker;

pub use discovery::{discover, DiscoverySummary};
pub use fetcher::{
    build_http_client, select_identity, ContentKind, HttpPageFetcher, PageFetcher, RawPage,
};
pub use parser::{HtmlPageParser, PageParser, ParsedPage};
pub use sink::{RecordSink, SinkClosed};
pub use splitter::{DateRange, DateRanges, EARLIEST_DATE};
pub use walker::{CursorWalker, EmitOrder, WalkEnd, WalkSummary, DEFAULT_MAX_POLITENESS_DELAY};

/// In-memory collaborators for exercising walks without a network
#[cfg(test)]
pub(crate) mod test_support {
    use super::fetcher::{PageFetcher, RawPage};
    use super::parser::{PageParser, ParsedPage};
    use crate::record::{from_epoch_seconds, CandidateRecord};
    use crate::search::SearchRequest;
    use crate::Result;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Encodes a listing page as `id@epoch,id@epoch|cursor`
    pub(crate) fn page(records: &[(&str, i64)], cursor: Option<&str>) -> RawPage {
        let items: Vec<String> = records
            .iter()
            .map(|(id, epoch)| format!("{}@{}", id, epoch))
            .collect();
        RawPage::structured(format!("{}|{}", items.join(","), cursor.unwrap_or("")))
    }

    /// Parses pages produced by [`page`]
    pub(crate) struct LineParser;

    impl PageParser for LineParser {
        fn parse(&self, raw: &RawPage) -> Result<ParsedPage> {
            let (items, cursor) = raw.body.split_once('|').unwrap_or((raw.body.as_str(), ""));
            let records = items
                .split(',')
                .filter(|item| !item.is_empty())
                .filter_map(|item| {
                    let (id, epoch) = item.split_once('@')?;
                    let created_at = from_epoch_seconds(epoch.parse().ok()?)?;
                    Some(CandidateRecord::new(id, created_at))
                })
                .collect();

            Ok(ParsedPage {
                records,
                next_cursor: Some(cursor.to_string()).filter(|c| !c.is_empty()),
            })
        }
    }

    /// Serves scripted pages, per query when scripted that way
    ///
    /// Once a script runs dry it serves empty pages, or, when endless,
    /// synthesizes full pages forever.
    pub(crate) struct ScriptedFetcher {
        scripts: Mutex<HashMap<String, VecDeque<RawPage>>>,
        requests: Mutex<Vec<SearchRequest>>,
        endless: bool,
        latency: Duration,
    }

    impl ScriptedFetcher {
        pub(crate) const ENDLESS_PAGE_SIZE: usize = 5;

        pub(crate) fn new(pages: Vec<RawPage>) -> Self {
            Self::per_query(vec![(String::new(), pages)])
        }

        pub(crate) fn per_query(scripts: Vec<(String, Vec<RawPage>)>) -> Self {
            Self {
                scripts: Mutex::new(
                    scripts
                        .into_iter()
                        .map(|(query, pages)| (query, pages.into()))
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
                endless: false,
                latency: Duration::ZERO,
            }
        }

        pub(crate) fn endless() -> Self {
            Self::new(Vec::new()).then_endless()
        }

        /// Synthesizes full pages forever once the scripted pages run out
        pub(crate) fn then_endless(mut self) -> Self {
            self.endless = true;
            self
        }

        pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        pub(crate) fn cursors(&self) -> Vec<Option<String>> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.cursor().map(str::to_string))
                .collect()
        }

        pub(crate) fn queries(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.query().unwrap_or("").to_string())
                .collect()
        }

        fn next_page(&self, request: &SearchRequest) -> RawPage {
            let served = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request.clone());
                requests.len()
            };

            let mut scripts = self.scripts.lock().unwrap();
            let query = request.query().unwrap_or("");
            let key = if scripts.contains_key(query) { query } else { "" };
            if let Some(next) = scripts.get_mut(key).and_then(VecDeque::pop_front) {
                return next;
            }

            if !self.endless {
                return page(&[], None);
            }

            let size = Self::ENDLESS_PAGE_SIZE as i64;
            let top = 1_000_000_000 - served as i64 * size;
            let ids: Vec<(String, i64)> = (0..size)
                .map(|i| ((top - i).to_string(), top - i))
                .collect();
            let refs: Vec<(&str, i64)> = ids.iter().map(|(id, at)| (id.as_str(), *at)).collect();
            page(&refs, Some(&format!("c{}", served)))
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, request: &SearchRequest) -> Result<RawPage> {
            let next = self.next_page(request);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            Ok(next)
        }
    }
}
