//! Integration tests for the pipeline
//!
//! These tests use wiremock to stand in for the search listing and the
//! look-up endpoint, and drive the real HTTP fetcher, HTML parser and look-up
//! client end-to-end.

use backscroll::config::{FetcherConfig, IdentityPolicy, LookupConfig};
use backscroll::crawler::{HtmlPageParser, HttpPageFetcher};
use backscroll::hydrate::HttpLookupClient;
use backscroll::pipeline::{CrawlPipeline, PipelineSettings};
use backscroll::search::{SearchOptions, SearchSpec};
use backscroll::BackscrollError;
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 2015-01-06T00:00:00Z
const JAN_6: i64 = 1_420_502_400;
const HOUR: i64 = 3600;

fn tweet_html(id: &str, epoch: i64) -> String {
    format!(
        r#"<div class="tweet original-tweet" data-tweet-id="{id}" data-user-id="42" data-screen-name="rustlang" data-name="Rust">
            <span class="_timestamp" data-time="{epoch}"></span>
            <p class="tweet-text" lang="en">post {id} <a class="twitter-hashtag">#rust</a></p>
        </div>"#
    )
}

fn items(records: &[(&str, i64)]) -> String {
    records
        .iter()
        .map(|(id, epoch)| tweet_html(id, *epoch))
        .collect()
}

/// A first listing page; the cursor sits on the stream container
fn html_page(records: &[(&str, i64)], cursor: Option<&str>) -> ResponseTemplate {
    let cursor_attr = cursor
        .map(|c| format!(r#" data-min-position="{}""#, c))
        .unwrap_or_default();
    let body = format!(
        r#"<html><head><title>Search</title></head><body>
        <div class="stream-container"{}>{}</div>
        </body></html>"#,
        cursor_attr,
        items(records)
    );
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

/// A follow-up listing page as the timeline endpoint serves it
fn json_page(records: &[(&str, i64)], cursor: Option<&str>) -> ResponseTemplate {
    let body = serde_json::json!({
        "items_html": items(records),
        "min_position": cursor.unwrap_or(""),
        "has_more_items": cursor.is_some(),
    });
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json")
}

fn post_json(id: &str, epoch: i64) -> serde_json::Value {
    let created_at = Utc.timestamp_opt(epoch, 0).unwrap();
    serde_json::json!({
        "id_str": id,
        "created_at": created_at.format("%a %b %d %H:%M:%S %z %Y").to_string(),
        "text": format!("post {}", id),
    })
}

fn fetcher_config(server: &MockServer) -> FetcherConfig {
    FetcherConfig {
        search_url: format!("{}/search", server.uri()),
        timeline_url: format!("{}/i/search/timeline", server.uri()),
        user_agents: vec!["BackscrollTest/1.0".to_string()],
        identity_policy: IdentityPolicy::First,
        max_politeness_delay_ms: 0,
        timeout_secs: 5,
    }
}

fn lookup_config(server: &MockServer) -> LookupConfig {
    LookupConfig {
        endpoint: format!("{}/lookup.json", server.uri()),
        delay_ms: 0,
        ..LookupConfig::default()
    }
}

fn rust_hashtag() -> SearchOptions {
    SearchOptions {
        hashtags: Some("rust".to_string()),
        ..Default::default()
    }
}

fn create_pipeline(server: &MockServer, spec: SearchSpec) -> CrawlPipeline {
    let fetcher = HttpPageFetcher::new(&fetcher_config(server)).unwrap();
    CrawlPipeline::new(
        spec,
        Arc::new(fetcher),
        Arc::new(HtmlPageParser::new()),
        PipelineSettings::immediate(),
    )
    .unwrap()
}

/// Mounts a three-page listing: html, json with more, json exhausted
async fn mount_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "#rust"))
        .and(query_param("f", "tweets"))
        .and(header("user-agent", "BackscrollTest/1.0"))
        .respond_with(html_page(
            &[("105", JAN_6 + 5 * HOUR), ("104", JAN_6 + 4 * HOUR)],
            Some("TWEET-104-105"),
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/i/search/timeline"))
        .and(query_param("max_position", "TWEET-104-105"))
        .respond_with(json_page(
            &[
                ("103", JAN_6 + 3 * HOUR),
                ("102", JAN_6 + 2 * HOUR),
                ("101", JAN_6 + HOUR),
            ],
            Some("TWEET-101-105"),
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/i/search/timeline"))
        .and(query_param("max_position", "TWEET-101-105"))
        .respond_with(json_page(&[], None))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_unhydrated_walk_follows_cursors_across_endpoints() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    let spec = SearchSpec::new(rust_hashtag(), None, None, false, false).unwrap();
    let records = create_pipeline(&server, spec)
        .run_unhydrated()
        .collect()
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.tweet_id.as_str()).collect();
    assert_eq!(ids, vec!["105", "104", "103", "102", "101"]);

    let first = &records[0];
    assert_eq!(first.screen_name, "rustlang");
    assert_eq!(first.user_id, "42");
    assert_eq!(first.lang, "en");
    assert_eq!(first.hashtag, "#rust");
    assert_eq!(first.retweet_count, "NA");
    assert_eq!(first.created_at.timestamp(), JAN_6 + 5 * HOUR);
}

#[tokio::test]
async fn test_chronological_walk_emits_oldest_first() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    let spec = SearchSpec::new(rust_hashtag(), None, None, false, true).unwrap();
    let records = create_pipeline(&server, spec)
        .run_unhydrated()
        .collect()
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.tweet_id.as_str()).collect();
    assert_eq!(ids, vec!["101", "102", "103", "104", "105"]);
}

#[tokio::test]
async fn test_hydrated_run_returns_posts_sorted_by_creation() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    // The look-up endpoint answers out of order and omits one post
    let answer = serde_json::json!([
        post_json("103", JAN_6 + 3 * HOUR),
        post_json("105", JAN_6 + 5 * HOUR),
        post_json("101", JAN_6 + HOUR),
        post_json("104", JAN_6 + 4 * HOUR),
    ]);
    Mock::given(method("POST"))
        .and(path("/lookup.json"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_string_contains("id=105%2C104%2C103%2C102%2C101"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(answer.to_string(), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let lookup = HttpLookupClient::new(&lookup_config(&server), "test-token").unwrap();
    let spec = SearchSpec::new(rust_hashtag(), None, None, false, false).unwrap();
    let records = create_pipeline(&server, spec)
        .run(Arc::new(lookup))
        .collect()
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["101", "103", "104", "105"]);
    assert_eq!(records[0].payload["text"], "post 101");
}

#[tokio::test]
async fn test_daily_search_walks_each_day_oldest_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "#rust since:2015-01-06 until:2015-01-07"))
        .respond_with(html_page(
            &[("12", JAN_6 + 12 * HOUR), ("11", JAN_6 + 11 * HOUR)],
            None,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "#rust since:2015-01-07 until:2015-01-08"))
        .respond_with(html_page(
            &[("22", JAN_6 + 36 * HOUR), ("21", JAN_6 + 35 * HOUR)],
            None,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let spec = SearchSpec::parse(
        rust_hashtag(),
        Some("2015-01-06"),
        Some("2015-01-08"),
        true,
        false,
    )
    .unwrap();
    let records = create_pipeline(&server, spec)
        .run_unhydrated()
        .collect()
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.tweet_id.as_str()).collect();
    assert_eq!(ids, vec!["11", "12", "21", "22"]);
}

#[tokio::test]
async fn test_exact_time_bounds_filter_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "#rust since:2015-01-06 until:2015-01-07"))
        .respond_with(html_page(
            &[
                ("13", JAN_6 + 13 * HOUR),
                ("11", JAN_6 + 11 * HOUR),
                ("9", JAN_6 + 9 * HOUR),
            ],
            None,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let spec = SearchSpec::parse(
        rust_hashtag(),
        Some("2015-01-06 10:00"),
        Some("2015-01-06 12:00"),
        false,
        false,
    )
    .unwrap();
    let records = create_pipeline(&server, spec)
        .run_unhydrated()
        .collect()
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.tweet_id.as_str()).collect();
    assert_eq!(ids, vec!["11"]);
}

#[tokio::test]
async fn test_unexpected_content_type_aborts_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "image/png"))
        .mount(&server)
        .await;

    let spec = SearchSpec::new(rust_hashtag(), None, None, false, false).unwrap();
    let result = create_pipeline(&server, spec).run_unhydrated().collect().await;

    match result {
        Err(BackscrollError::TransportShape { content_type }) => {
            assert!(content_type.contains("image/png"))
        }
        other => panic!("expected a transport shape error, got {:?}", other.map(|r| r.len())),
    }
}

#[tokio::test]
async fn test_listing_error_status_aborts_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let spec = SearchSpec::new(rust_hashtag(), None, None, false, false).unwrap();
    let result = create_pipeline(&server, spec).run_unhydrated().collect().await;

    assert!(matches!(
        result,
        Err(BackscrollError::HttpStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_lookup_rejection_surfaces_batch_call_error() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    Mock::given(method("POST"))
        .and(path("/lookup.json"))
        .respond_with(ResponseTemplate::new(401).set_body_raw(
            r#"{"errors":[{"code":89,"message":"Invalid or expired token."}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let lookup = HttpLookupClient::new(&lookup_config(&server), "stale-token").unwrap();
    let spec = SearchSpec::new(rust_hashtag(), None, None, false, false).unwrap();
    let result = create_pipeline(&server, spec)
        .run(Arc::new(lookup))
        .collect()
        .await;

    match result {
        Err(BackscrollError::BatchCall { status, message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("Invalid or expired token"));
        }
        other => panic!("expected a batch call error, got {:?}", other.map(|r| r.len())),
    }
}
