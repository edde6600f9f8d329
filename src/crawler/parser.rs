//! Listing page parser
//!
//! This module extracts from one listing page:
//! - The candidate records (one per `div.original-tweet`)
//! - The cursor addressing the next, older page
//!
//! The first page of a search is a full HTML document carrying its cursor in
//! a `data-min-position` attribute. Follow-up pages are a JSON envelope:
//! `{ "items_html": "<fragment>", "min_position": "<cursor>" }`.

use crate::crawler::fetcher::{ContentKind, RawPage};
use crate::record::{from_epoch_seconds, CandidateRecord};
use crate::{BackscrollError, Result};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;

/// Records and next-page cursor extracted from one listing page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Records in page order (newest first)
    pub records: Vec<CandidateRecord>,

    /// Cursor for the next page; `None` when the page carries none
    pub next_cursor: Option<String>,
}

/// Turns a raw listing page into records and a cursor
pub trait PageParser: Send + Sync {
    fn parse(&self, page: &RawPage) -> Result<ParsedPage>;
}

/// Parser for the search listing's HTML markup
#[derive(Debug, Clone, Default)]
pub struct HtmlPageParser;

#[derive(Debug, Deserialize)]
struct TimelineEnvelope {
    #[serde(default)]
    items_html: Option<String>,

    #[serde(default)]
    min_position: Option<Value>,
}

impl HtmlPageParser {
    pub fn new() -> Self {
        Self
    }
}

impl PageParser for HtmlPageParser {
    fn parse(&self, page: &RawPage) -> Result<ParsedPage> {
        match &page.kind {
            ContentKind::Html => {
                let document = Html::parse_document(&page.body);
                Ok(ParsedPage {
                    next_cursor: extract_min_position(&document),
                    records: extract_records(&document),
                })
            }
            ContentKind::Structured => {
                let envelope: TimelineEnvelope = serde_json::from_str(&page.body)?;
                let next_cursor = envelope.min_position.as_ref().and_then(cursor_value);

                let records = match envelope.items_html.as_deref() {
                    Some(fragment) if !fragment.trim().is_empty() => {
                        extract_records(&Html::parse_fragment(fragment))
                    }
                    _ => Vec::new(),
                };

                Ok(ParsedPage {
                    records,
                    next_cursor,
                })
            }
            ContentKind::Other(content_type) => Err(BackscrollError::TransportShape {
                content_type: content_type.clone(),
            }),
        }
    }
}

fn cursor_value(value: &Value) -> Option<String> {
    let cursor = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(cursor).filter(|c| !c.is_empty())
}

/// Finds the cursor attribute anywhere in the document
fn extract_min_position(document: &Html) -> Option<String> {
    let selector = Selector::parse("[data-min-position]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("data-min-position"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

struct Selectors {
    tweet: Selector,
    timestamp: Selector,
    text: Selector,
    hashtag: Selector,
    retweets: Selector,
    favorites: Selector,
    counter: Selector,
}

impl Selectors {
    fn build() -> Option<Self> {
        Some(Self {
            tweet: Selector::parse("div.original-tweet").ok()?,
            timestamp: Selector::parse("span._timestamp").ok()?,
            text: Selector::parse("p.tweet-text").ok()?,
            hashtag: Selector::parse("a.twitter-hashtag").ok()?,
            retweets: Selector::parse("div.ProfileTweet-action--retweet").ok()?,
            favorites: Selector::parse("div.ProfileTweet-action--favorite").ok()?,
            counter: Selector::parse("div.IconTextContainer").ok()?,
        })
    }
}

/// Extracts every well-formed record, in document order
fn extract_records(document: &Html) -> Vec<CandidateRecord> {
    let Some(selectors) = Selectors::build() else {
        return Vec::new();
    };

    document
        .select(&selectors.tweet)
        .filter_map(|element| extract_record(element, &selectors))
        .collect()
}

fn extract_record(element: ElementRef<'_>, selectors: &Selectors) -> Option<CandidateRecord> {
    let attr = |name: &str| element.value().attr(name).unwrap_or("").to_string();

    let tweet_id = attr("data-tweet-id");
    if tweet_id.is_empty() {
        tracing::debug!("Skipping listing entry without an identifier");
        return None;
    }

    let created_at = element
        .select(&selectors.timestamp)
        .next()
        .and_then(|ts| ts.value().attr("data-time"))
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(from_epoch_seconds);
    let Some(created_at) = created_at else {
        tracing::debug!("Skipping entry {} without a usable timestamp", tweet_id);
        return None;
    };

    let text_node = element.select(&selectors.text).next();
    let (tweet_text, lang, hashtag) = match text_node {
        Some(node) => {
            let hashtags: Vec<String> = node
                .select(&selectors.hashtag)
                .map(|h| h.text().collect::<String>())
                .collect();
            (
                node.text().collect::<String>().trim().to_string(),
                node.value().attr("lang").unwrap_or("NONE").to_string(),
                hashtags.join(" "),
            )
        }
        None => (String::new(), "NONE".to_string(), String::new()),
    };

    Some(CandidateRecord {
        tweet_id,
        created_at,
        user_id: attr("data-user-id"),
        screen_name: attr("data-screen-name"),
        user_name: attr("data-name"),
        tweet_text,
        lang,
        hashtag,
        retweet_count: extract_count(element, &selectors.retweets, &selectors.counter),
        favorite_count: extract_count(element, &selectors.favorites, &selectors.counter),
    })
}

/// Reads a rendered counter, `NA` when the action block is missing
fn extract_count(element: ElementRef<'_>, action: &Selector, counter: &Selector) -> String {
    match element.select(action).next() {
        Some(node) => node
            .select(counter)
            .next()
            .map(|c| c.text().collect::<String>().trim().to_string())
            .unwrap_or_default(),
        None => "NA".to_string(),
    }
}
