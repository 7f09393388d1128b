//! Prometheus メトリクス定義。
use prometheus::{
    Counter, Gauge, Histogram, HistogramOpts, Registry, register_counter_with_registry,
    register_gauge_with_registry, register_histogram_with_registry,
};

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    // パス
    pub passes_completed: Counter,
    pub passes_failed: Counter,
    pub edits_ingested: Counter,
    pub views_degraded: Counter,
    pub pass_duration: Histogram,
    pub contested_topics: Gauge,
    pub edit_wars: Gauge,

    // 記事プロファイル
    pub profile_lookups: Counter,
    pub profile_not_found: Counter,
    pub profile_failures: Counter,
    pub profile_duration: Histogram,

    pub upstream_retries: Counter,
}

impl Metrics {
    /// # Errors
    /// 同名のメトリクスが既に登録されている場合はエラーを返す。
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            passes_completed: register_counter_with_registry!(
                "radar_passes_completed_total",
                "Total number of radar passes that published a snapshot",
                registry
            )?,
            passes_failed: register_counter_with_registry!(
                "radar_passes_failed_total",
                "Total number of radar passes aborted by a change-feed failure",
                registry
            )?,
            edits_ingested: register_counter_with_registry!(
                "radar_edits_ingested_total",
                "Total number of edit records aggregated",
                registry
            )?,
            views_degraded: register_counter_with_registry!(
                "radar_views_degraded_total",
                "Passes that proceeded without view data",
                registry
            )?,
            pass_duration: register_histogram_with_registry!(
                HistogramOpts::new(
                    "radar_pass_duration_seconds",
                    "Wall time of one radar pass including fetches"
                )
                .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
                registry
            )?,
            contested_topics: register_gauge_with_registry!(
                "radar_contested_topics",
                "Contested topics in the latest snapshot",
                registry
            )?,
            edit_wars: register_gauge_with_registry!(
                "radar_edit_wars",
                "Edit wars in the latest snapshot",
                registry
            )?,
            profile_lookups: register_counter_with_registry!(
                "radar_profile_lookups_total",
                "Total number of article profile lookups",
                registry
            )?,
            profile_not_found: register_counter_with_registry!(
                "radar_profile_not_found_total",
                "Profile lookups for articles that do not exist",
                registry
            )?,
            profile_failures: register_counter_with_registry!(
                "radar_profile_failures_total",
                "Profile lookups aborted by upstream failure or timeout",
                registry
            )?,
            profile_duration: register_histogram_with_registry!(
                HistogramOpts::new(
                    "radar_profile_duration_seconds",
                    "Wall time of one article profile lookup"
                )
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]),
                registry
            )?,
            upstream_retries: register_counter_with_registry!(
                "radar_upstream_retries_total",
                "Upstream HTTP calls retried after a transient failure",
                registry
            )?,
        })
    }
}
