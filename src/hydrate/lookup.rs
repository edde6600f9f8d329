//! Batched look-up client
//!
//! One call resolves up to a batch of identifiers to full post objects. The
//! endpoint returns them in no particular order and silently omits posts it
//! cannot return.

use crate::config::LookupConfig;
use crate::crawler::build_http_client;
use crate::record::HydratedRecord;
use crate::{BackscrollError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Resolves identifiers to full records, one round trip per call
#[async_trait]
pub trait BatchLookupClient: Send + Sync {
    async fn post(&self, ids: &[String]) -> Result<Vec<HydratedRecord>>;
}

/// Look-up client speaking to the statuses look-up endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpLookupClient {
    client: Client,
    endpoint: String,
    bearer_token: String,
}

impl HttpLookupClient {
    pub fn new(config: &LookupConfig, bearer_token: impl Into<String>) -> Result<Self> {
        let client = build_http_client(None, Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            bearer_token: bearer_token.into(),
        })
    }
}

#[async_trait]
impl BatchLookupClient for HttpLookupClient {
    async fn post(&self, ids: &[String]) -> Result<Vec<HydratedRecord>> {
        let joined = ids.join(",");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.bearer_token)
            .form(&[("id", joined.as_str())])
            .send()
            .await
            .map_err(|source| BackscrollError::Http {
                url: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| BackscrollError::Http {
            url: self.endpoint.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(BackscrollError::BatchCall {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        match serde_json::from_str::<Value>(&body)? {
            Value::Array(items) => items.into_iter().map(HydratedRecord::from_json).collect(),
            other => Err(BackscrollError::MalformedRecord(format!(
                "expected a JSON array of posts, got {}",
                other
            ))),
        }
    }
}
