//! Shared HTTP plumbing for the upstream sources: client construction and retrying JSON GETs.

use std::time::Duration;

use anyhow::{Context, Result};
use prometheus::Counter;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{clients::error::SourceError, util::retry::RetryConfig};

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
    pub max_retries: usize,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
}

/// Upstream client shared by every source; cheap to clone.
#[derive(Debug, Clone)]
pub(crate) struct UpstreamHttp {
    client: Client,
    retry: RetryConfig,
    retries: Counter,
}

impl UpstreamHttp {
    /// # Errors
    /// HTTP クライアントの構築に失敗した場合はエラーを返す。
    pub(crate) fn new(settings: &HttpSettings, retries: Counter) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.total_timeout)
            .gzip(true)
            .build()
            .context("failed to build upstream HTTP client")?;

        // max_retries counts retries; the first attempt is extra
        let retry = RetryConfig::new(
            settings.max_retries.saturating_add(1),
            settings.backoff_base_ms,
            settings.backoff_cap_ms,
        );

        Ok(Self {
            client,
            retry,
            retries,
        })
    }

    /// GET して JSON をデコードする。再試行可能なエラーのみバックオフ付きで再試行する。
    ///
    /// `what` は 404 のときに `NotFound` に載せる対象の説明。
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        source_name: &'static str,
        url: Url,
        what: &str,
    ) -> Result<T, SourceError> {
        let mut attempt = 0;

        loop {
            match self.get_once(source_name, url.clone(), what).await {
                Ok(body) => {
                    if attempt > 0 {
                        debug!(source = source_name, attempt, "upstream call succeeded after retry");
                    }
                    return Ok(body);
                }
                Err(err) => {
                    attempt += 1;

                    if !err.is_retryable() || !self.retry.can_retry(attempt) {
                        if err.is_retryable() {
                            warn!(
                                source = source_name,
                                attempt,
                                max_attempts = self.retry.max_attempts,
                                error = %err,
                                "upstream call failed after all retries"
                            );
                        }
                        return Err(err);
                    }

                    let delay = self.retry.delay_for_attempt(attempt);
                    self.retries.inc();
                    warn!(
                        source = source_name,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "upstream call failed, retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        source_name: &'static str,
        url: Url,
        what: &str,
    ) -> Result<T, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(source_name, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::from_status(source_name, status, what));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::from_reqwest(source_name, &e))?;
        serde_json::from_slice(&bytes).map_err(|e| SourceError::malformed(source_name, e.to_string()))
    }
}

/// Parses a configured base URL, tolerating a missing trailing slash.
pub(crate) fn parse_base_url(raw: &str, name: &str) -> Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("invalid {name} URL: {raw}"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
