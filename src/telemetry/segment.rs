use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{EventSink, Message};

pub const SEGMENT_BATCH_URL: &str = "https://api.segment.io/v1/batch";
pub const WRITE_KEY_ENV: &str = "CRDA_SEGMENT_WRITE_KEY";

#[derive(Serialize)]
struct Batch<'a> {
    batch: &'a [Message],
}

/// Posts message batches to the Segment HTTP tracking API.
pub struct SegmentSink {
    http: Client,
    endpoint: String,
    write_key: String,
}

impl SegmentSink {
    pub fn new(endpoint: impl Into<String>, write_key: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: endpoint.into(),
            write_key: write_key.into(),
        }
    }

    /// Sink for the write key in `CRDA_SEGMENT_WRITE_KEY`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var(WRITE_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .map(|key| Self::new(SEGMENT_BATCH_URL, key))
    }
}

#[async_trait]
impl EventSink for SegmentSink {
    async fn send(&self, messages: Vec<Message>) -> Result<()> {
        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.write_key, Some(""))
            .json(&Batch { batch: &messages })
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("failed to push telemetry to segment, {}", response.status());
        }
        Ok(())
    }
}
