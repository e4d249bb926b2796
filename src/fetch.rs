//! Remote source access.
//!
//! [`Source`] is the seam the refresh pipeline talks to; [`HttpFetcher`] is
//! the real implementation, issuing one `GET` per item against
//! `<base>/<id>/info.0.json`, or `<base>/info.0.json` for the newest item.
//!
//! No retries and no timeout beyond the transport default. Every failure is
//! returned as a [`FetchError`] for the caller to log and skip.

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::gate::ConcurrencyGate;
use crate::models::WireRecord;

/// ID value that asks the source for its newest item.
pub const LATEST: u64 = 0;

/// Something that can hand out wire records by ID.
#[async_trait]
pub trait Source: Send + Sync {
    /// Fetch one item; `id == LATEST` fetches the newest.
    async fn fetch(&self, id: u64) -> Result<WireRecord, FetchError>;

    /// ID of the newest item the source knows about.
    async fn latest_id(&self) -> Result<u64, FetchError> {
        Ok(self.fetch(LATEST).await?.id)
    }
}

/// HTTP implementation of [`Source`], bounded by a [`ConcurrencyGate`].
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    gate: ConcurrencyGate,
}

impl HttpFetcher {
    pub fn new(config: &SourceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            gate: ConcurrencyGate::new(config.concurrency),
        })
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn url_for(&self, id: u64) -> String {
        if id == LATEST {
            format!("{}/info.0.json", self.base_url)
        } else {
            format!("{}/{}/info.0.json", self.base_url, id)
        }
    }

    /// Perform the request and read the body while holding one gate slot.
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let _permit = self.gate.acquire().await?;
        tracing::debug!(url, "started download");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if status.as_u16() >= 400 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        tracing::debug!(url, bytes = body.len(), "finished download");
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Source for HttpFetcher {
    async fn fetch(&self, id: u64) -> Result<WireRecord, FetchError> {
        let url = self.url_for(id);
        let body = self.download(&url).await?;
        WireRecord::from_slice(&body).map_err(|source| FetchError::Decode { url, source })
    }
}
