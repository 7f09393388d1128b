use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Days, NaiveDate, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clients::{ArticleSource, ChangeFeedSource, SourceError, ViewCountSource},
    observability::metrics::Metrics,
};

pub mod aggregate;
pub mod categories;
pub mod contestation;
pub mod profile;
pub mod revert;
pub mod snapshot;
pub mod title;
pub mod topic;
pub mod types;
pub mod views;

use profile::{ScoredProfile, score_profile};
use snapshot::{PassInputs, RadarSnapshot, build_snapshot};
use title::normalize_title;
use types::{ArticleProfile, RadarLimits, TopViewedEntry};

/// 定期パス：変更フィードと閲覧数を並行取得し、揃ってから純粋関数でスナップショットを組み立てる。
pub struct RadarPipeline {
    feed: Arc<dyn ChangeFeedSource>,
    views: Arc<dyn ViewCountSource>,
    recent_changes_limit: usize,
    limits: RadarLimits,
    metrics: Arc<Metrics>,
}

impl RadarPipeline {
    #[must_use]
    pub fn new(
        feed: Arc<dyn ChangeFeedSource>,
        views: Arc<dyn ViewCountSource>,
        recent_changes_limit: usize,
        limits: RadarLimits,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            feed,
            views,
            recent_changes_limit,
            limits,
            metrics,
        }
    }

    /// Runs one pass. Only a change-feed failure fails the pass; view failures
    /// degrade to an empty top-viewed list.
    ///
    /// # Errors
    /// 変更フィードの取得に失敗した場合は `SourceError` を返す。
    pub async fn run_pass(
        &self,
        pass_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RadarSnapshot, SourceError> {
        // the top list for "today" is not published yet
        let view_date = now
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap_or_else(|| now.date_naive());

        let (edits, top_viewed) = tokio::join!(
            self.feed.fetch_recent_changes(self.recent_changes_limit),
            self.views.fetch_top_viewed(view_date),
        );
        let edits = edits?;
        let (top_viewed, views_degraded): (Vec<TopViewedEntry>, bool) = match top_viewed {
            Ok(entries) => (entries, false),
            Err(error) => {
                warn!(
                    %pass_id,
                    %view_date,
                    error = %error,
                    "view source failed; continuing without views"
                );
                self.metrics.views_degraded.inc();
                (Vec::new(), true)
            }
        };

        self.metrics.edits_ingested.inc_by(edits.len() as f64);

        let snapshot = build_snapshot(
            PassInputs {
                pass_id,
                generated_at: now,
                edits: &edits,
                top_viewed: &top_viewed,
                views_degraded,
            },
            &self.limits,
        );

        info!(
            %pass_id,
            edits = snapshot.stats.total_edits,
            articles = snapshot.stats.articles,
            contested = snapshot.stats.contested,
            edit_wars = snapshot.stats.edit_wars,
            views_degraded,
            "radar pass assembled"
        );
        Ok(snapshot)
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    /// The article (after redirects) does not exist.
    #[error("article not found: {title}")]
    NotFound { title: String },
    #[error("profile lookup failed: {0}")]
    Failed(#[source] SourceError),
    #[error("profile lookup timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSettings {
    pub revision_limit: usize,
    pub talk_revision_limit: usize,
    pub view_window_days: u32,
    pub timeout: Duration,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            revision_limit: 50,
            talk_revision_limit: 30,
            view_window_days: 60,
            timeout: Duration::from_secs(20),
        }
    }
}

/// オンデマンドの記事プロファイル取得。定期パスとは状態を共有しない。
pub struct ProfileLookup {
    articles: Arc<dyn ArticleSource>,
    views: Arc<dyn ViewCountSource>,
    settings: ProfileSettings,
    metrics: Arc<Metrics>,
}

impl ProfileLookup {
    #[must_use]
    pub fn new(
        articles: Arc<dyn ArticleSource>,
        views: Arc<dyn ViewCountSource>,
        settings: ProfileSettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            articles,
            views,
            settings,
            metrics,
        }
    }

    /// Fetches and scores one article, bounded by the configured deadline.
    ///
    /// # Errors
    /// 記事が存在しなければ `NotFound`、期限超過で `TimedOut`、その他の取得失敗は `Failed`。
    pub async fn lookup(
        &self,
        title: &str,
        today: NaiveDate,
    ) -> Result<ScoredProfile, LookupError> {
        self.metrics.profile_lookups.inc();
        let timer = self.metrics.profile_duration.start_timer();

        let deadline = self.settings.timeout;
        let result = tokio::time::timeout(deadline, self.fetch_and_score(title, today))
            .await
            .unwrap_or(Err(LookupError::TimedOut(deadline)));
        timer.observe_duration();

        match &result {
            Ok(profile) => info!(title = %profile.title, "profile lookup completed"),
            Err(LookupError::NotFound { title }) => {
                self.metrics.profile_not_found.inc();
                info!(%title, "profile lookup for missing article");
            }
            Err(error) => {
                self.metrics.profile_failures.inc();
                warn!(%title, error = %error, "profile lookup failed");
            }
        }
        result
    }

    async fn fetch_and_score(
        &self,
        title: &str,
        today: NaiveDate,
    ) -> Result<ScoredProfile, LookupError> {
        let requested = normalize_title(title);
        if requested.is_empty() {
            return Err(LookupError::NotFound { title: requested });
        }

        // metadata first: views and talk page are keyed by the redirect target
        let metadata = self
            .articles
            .fetch_article_metadata(&requested, self.settings.revision_limit)
            .await
            .map_err(|error| match error {
                SourceError::NotFound { .. } => LookupError::NotFound {
                    title: requested.clone(),
                },
                other => LookupError::Failed(other),
            })?;

        let (start, end) = view_window(today, self.settings.view_window_days);
        let (daily_views, talk) = tokio::join!(
            self.views.fetch_daily_views(&metadata.title, start, end),
            self.articles
                .fetch_talk_revisions(&metadata.title, self.settings.talk_revision_limit),
        );

        let daily_views = match daily_views {
            Ok(series) => series,
            Err(SourceError::NotFound { .. }) => Vec::new(),
            Err(other) => return Err(LookupError::Failed(other)),
        };
        let talk_revisions = match talk {
            Ok(revisions) => Some(revisions),
            Err(SourceError::NotFound { .. }) => None,
            Err(other) => return Err(LookupError::Failed(other)),
        };

        let profile = ArticleProfile::from_metadata(metadata, daily_views, talk_revisions);
        Ok(score_profile(&profile))
    }
}

/// Inclusive window of `days` complete days ending yesterday.
#[must_use]
pub fn view_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let end = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    let span = u64::from(days.max(1) - 1);
    let start = end.checked_sub_days(Days::new(span)).unwrap_or(end);
    (start, end)
}
