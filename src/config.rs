use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

use crate::pipeline::types::RadarLimits;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    mediawiki_api_url: String,
    pageviews_base_url: String,
    wiki_project: String,
    user_agent: String,
    upstream_connect_timeout: Duration,
    upstream_total_timeout: Duration,
    http_max_retries: usize,
    http_backoff_base_ms: u64,
    http_backoff_cap_ms: u64,
    otel_exporter_endpoint: Option<String>,
    otel_sampling_ratio: f64,
    poll_interval: Duration,
    recent_changes_limit: usize,
    radar_limits: RadarLimits,
    profile_revision_limit: usize,
    profile_talk_revision_limit: usize,
    profile_view_window_days: u32,
    profile_lookup_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から Wiki Radar の設定値を読み込み、検証する。
    ///
    /// すべての値にデフォルトがあるため、未設定の変数はエラーにならない。
    ///
    /// # Errors
    /// 数値・アドレス・真偽値のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_bind = parse_socket_addr("WIKI_RADAR_HTTP_BIND", "0.0.0.0:9010")?;

        // Upstream endpoints
        let mediawiki_api_url = env::var("MEDIAWIKI_API_URL")
            .unwrap_or_else(|_| "https://en.wikipedia.org/w/api.php".to_string());
        let pageviews_base_url = env::var("PAGEVIEWS_BASE_URL").unwrap_or_else(|_| {
            "https://wikimedia.org/api/rest_v1/metrics/pageviews/".to_string()
        });
        let wiki_project = env::var("WIKI_PROJECT").unwrap_or_else(|_| "en.wikipedia".to_string());
        let user_agent = env::var("WIKI_RADAR_USER_AGENT")
            .unwrap_or_else(|_| format!("wiki-radar/{}", env!("CARGO_PKG_VERSION")));

        // HTTP timeout settings
        let upstream_connect_timeout = parse_duration_ms("UPSTREAM_CONNECT_TIMEOUT_MS", 3000)?;
        let upstream_total_timeout = parse_duration_ms("UPSTREAM_TOTAL_TIMEOUT_MS", 15000)?;

        // Retry settings (exponential backoff + jitter)
        let http_max_retries = parse_usize("HTTP_MAX_RETRIES", 3)?;
        let http_backoff_base_ms = parse_u64("HTTP_BACKOFF_BASE_MS", 250)?;
        let http_backoff_cap_ms = parse_u64("HTTP_BACKOFF_CAP_MS", 10000)?;

        // OpenTelemetry settings
        let otel_exporter_endpoint = env::var("OTEL_EXPORTER_ENDPOINT").ok();
        let otel_sampling_ratio = parse_f64("OTEL_SAMPLING_RATIO", 1.0)?;

        // Periodic pass settings
        let poll_interval = parse_duration_secs("RADAR_POLL_INTERVAL_SECS", 60)?;
        let recent_changes_limit = parse_usize("RADAR_RECENT_CHANGES_LIMIT", 500)?;
        let radar_limits = RadarLimits {
            contested_cap: parse_usize("RADAR_CONTESTED_CAP", 30)?,
            category_preview_cap: parse_usize("RADAR_CATEGORY_PREVIEW_CAP", 5)?,
            top_viewed_cap: parse_usize("RADAR_TOP_VIEWED_CAP", 20)?,
            trending_cap: parse_usize("RADAR_TRENDING_CAP", 10)?,
            recent_feed_cap: parse_usize("RADAR_RECENT_FEED_CAP", 50)?,
        };

        // On-demand profile settings
        let profile_revision_limit = parse_usize("PROFILE_REVISION_LIMIT", 50)?;
        let profile_talk_revision_limit = parse_usize("PROFILE_TALK_REVISION_LIMIT", 30)?;
        let profile_view_window_days = parse_u32("PROFILE_VIEW_WINDOW_DAYS", 60)?;
        let profile_lookup_timeout = parse_duration_secs("PROFILE_LOOKUP_TIMEOUT_SECS", 20)?;

        if poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                name: "RADAR_POLL_INTERVAL_SECS",
                source: anyhow::anyhow!("must be greater than zero"),
            });
        }

        Ok(Self {
            http_bind,
            mediawiki_api_url,
            pageviews_base_url,
            wiki_project,
            user_agent,
            upstream_connect_timeout,
            upstream_total_timeout,
            http_max_retries,
            http_backoff_base_ms,
            http_backoff_cap_ms,
            otel_exporter_endpoint,
            otel_sampling_ratio,
            poll_interval,
            recent_changes_limit,
            radar_limits,
            profile_revision_limit,
            profile_talk_revision_limit,
            profile_view_window_days,
            profile_lookup_timeout,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn mediawiki_api_url(&self) -> &str {
        &self.mediawiki_api_url
    }

    #[must_use]
    pub fn pageviews_base_url(&self) -> &str {
        &self.pageviews_base_url
    }

    #[must_use]
    pub fn wiki_project(&self) -> &str {
        &self.wiki_project
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn upstream_connect_timeout(&self) -> Duration {
        self.upstream_connect_timeout
    }

    #[must_use]
    pub fn upstream_total_timeout(&self) -> Duration {
        self.upstream_total_timeout
    }

    #[must_use]
    pub fn http_max_retries(&self) -> usize {
        self.http_max_retries
    }

    #[must_use]
    pub fn http_backoff_base_ms(&self) -> u64 {
        self.http_backoff_base_ms
    }

    #[must_use]
    pub fn http_backoff_cap_ms(&self) -> u64 {
        self.http_backoff_cap_ms
    }

    #[must_use]
    pub fn otel_exporter_endpoint(&self) -> Option<&str> {
        self.otel_exporter_endpoint.as_deref()
    }

    #[must_use]
    pub fn otel_sampling_ratio(&self) -> f64 {
        self.otel_sampling_ratio
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    #[must_use]
    pub fn recent_changes_limit(&self) -> usize {
        self.recent_changes_limit
    }

    #[must_use]
    pub fn radar_limits(&self) -> RadarLimits {
        self.radar_limits
    }

    #[must_use]
    pub fn profile_revision_limit(&self) -> usize {
        self.profile_revision_limit
    }

    #[must_use]
    pub fn profile_talk_revision_limit(&self) -> usize {
        self.profile_talk_revision_limit
    }

    #[must_use]
    pub fn profile_view_window_days(&self) -> u32 {
        self.profile_view_window_days
    }

    #[must_use]
    pub fn profile_lookup_timeout(&self) -> Duration {
        self.profile_lookup_timeout
    }
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());

    raw.parse().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_duration_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_secs)?;
    Ok(Duration::from_secs(value))
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_ms)?;
    Ok(Duration::from_millis(value))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let value = raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("value must be between 0.0 and 1.0"),
        });
    }
    Ok(value)
}
