use reqwest::StatusCode;
use thiserror::Error;

/// Failure of one upstream call, classified for the degradation and lookup policies.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name} unavailable: {detail}")]
    UpstreamUnavailable {
        source_name: &'static str,
        detail: String,
        retryable: bool,
    },
    #[error("not found: {what}")]
    NotFound { what: String },
    #[error("malformed response from {source_name}: {detail}")]
    MalformedResponse {
        source_name: &'static str,
        detail: String,
    },
}

impl SourceError {
    pub(crate) fn unavailable(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            source_name,
            detail: detail.into(),
            retryable: true,
        }
    }

    pub(crate) fn malformed(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            source_name,
            detail: detail.into(),
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// transport エラーを分類する。タイムアウト・接続失敗は再試行可能、デコード失敗は形式不正。
    pub(crate) fn from_reqwest(source_name: &'static str, error: &reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::malformed(source_name, error.to_string());
        }
        if let Some(status) = error.status() {
            return Self::from_status(source_name, status, &error.to_string());
        }
        Self::UpstreamUnavailable {
            source_name,
            detail: error.to_string(),
            retryable: error.is_timeout() || error.is_connect() || error.is_request(),
        }
    }

    /// 404 は NotFound、5xx と 429 は再試行可能、それ以外の 4xx は再試行しない。
    pub(crate) fn from_status(source_name: &'static str, status: StatusCode, what: &str) -> Self {
        if status == StatusCode::NOT_FOUND {
            return Self::not_found(what);
        }
        Self::UpstreamUnavailable {
            source_name,
            detail: format!("status {status}"),
            retryable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable {
                retryable: true,
                ..
            }
        )
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
