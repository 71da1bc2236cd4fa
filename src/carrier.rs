use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use crate::config::Config;
use crate::error::UpstreamError;

const ACCOUNT_HEADER: &str = "X-Account-Id";

/// Raw carrier answer. Interpreting it is up to the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_success(self) -> Result<Self, UpstreamError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(UpstreamError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// One POST to the carrier API. Implementations make a single attempt.
#[async_trait]
pub trait CarrierApi: Send + Sync {
    async fn post(&self, path: &str, payload: &Value) -> Result<UpstreamReply, UpstreamError>;
}

pub struct ZipnovaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    account_id: String,
    timeout: Duration,
}

fn build_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

impl ZipnovaClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(build_headers())
            .build()
            .context("failed to build carrier HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            account_id: config.account_id.clone(),
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl CarrierApi for ZipnovaClient {
    async fn post(&self, path: &str, payload: &Value) -> Result<UpstreamReply, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let request = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(ACCOUNT_HEADER, &self.account_id)
            .json(payload);

        // The deadline covers the body as well as the headers.
        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match timeout(self.timeout, exchange).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(error)) => return Err(UpstreamError::Transport(error)),
            Err(_) => return Err(UpstreamError::Timeout(self.timeout)),
        };

        debug!(
            %url,
            status,
            latency_ms = start.elapsed().as_millis() as u64,
            "carrier replied"
        );

        Ok(UpstreamReply { status, body })
    }
}
