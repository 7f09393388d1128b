use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;

use crate::{
    api,
    clients::{
        ArticleSource, ChangeFeedSource, HttpSettings, MediaWikiClient, PageviewsClient,
        ViewCountSource, http::UpstreamHttp,
    },
    config::Config,
    observability::Telemetry,
    pipeline::{ProfileLookup, ProfileSettings, RadarPipeline, snapshot::SnapshotBoard},
    scheduler::Scheduler,
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

/// Upstream sources the registry wires into the pass and lookup orchestrators.
pub struct Sources {
    pub feed: Arc<dyn ChangeFeedSource>,
    pub views: Arc<dyn ViewCountSource>,
    pub articles: Arc<dyn ArticleSource>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    scheduler: Scheduler,
    profiles: Arc<ProfileLookup>,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.registry.scheduler
    }

    pub(crate) fn board(&self) -> &SnapshotBoard {
        self.registry.scheduler.board()
    }

    pub(crate) fn profiles(&self) -> Arc<ProfileLookup> {
        Arc::clone(&self.registry.profiles)
    }
}

impl ComponentRegistry {
    /// 構成情報から上流クライアントとオーケストレータを組み立てる。
    ///
    /// # Errors
    /// Telemetry の初期化や HTTP クライアント構築が失敗した場合はエラーを返す。
    pub fn build(config: Config) -> Result<Self> {
        let telemetry = Telemetry::new(config.otel_exporter_endpoint(), config.otel_sampling_ratio())
            .context("failed to initialise telemetry")?;

        let settings = HttpSettings {
            user_agent: config.user_agent().to_string(),
            connect_timeout: config.upstream_connect_timeout(),
            total_timeout: config.upstream_total_timeout(),
            max_retries: config.http_max_retries(),
            backoff_base_ms: config.http_backoff_base_ms(),
            backoff_cap_ms: config.http_backoff_cap_ms(),
        };
        let http = UpstreamHttp::new(&settings, telemetry.metrics().upstream_retries.clone())?;

        let mediawiki = Arc::new(
            MediaWikiClient::new(config.mediawiki_api_url(), http.clone())
                .context("failed to configure MediaWiki client")?,
        );
        let pageviews = Arc::new(
            PageviewsClient::new(config.pageviews_base_url(), config.wiki_project(), http)
                .context("failed to configure Pageviews client")?,
        );

        let sources = Sources {
            feed: Arc::clone(&mediawiki) as Arc<dyn ChangeFeedSource>,
            views: pageviews,
            articles: mediawiki,
        };
        Ok(Self::from_parts(config, telemetry, sources))
    }

    /// Wires the orchestrators around already-constructed sources.
    #[must_use]
    pub fn from_parts(config: Config, telemetry: Telemetry, sources: Sources) -> Self {
        let config = Arc::new(config);
        let metrics = telemetry.metrics_arc();

        let pipeline = Arc::new(RadarPipeline::new(
            sources.feed,
            Arc::clone(&sources.views),
            config.recent_changes_limit(),
            config.radar_limits(),
            Arc::clone(&metrics),
        ));
        let scheduler = Scheduler::new(pipeline, SnapshotBoard::new(), Arc::clone(&metrics));

        let profiles = Arc::new(ProfileLookup::new(
            sources.articles,
            sources.views,
            ProfileSettings {
                revision_limit: config.profile_revision_limit(),
                talk_revision_limit: config.profile_talk_revision_limit(),
                view_window_days: config.profile_view_window_days(),
                timeout: config.profile_lookup_timeout(),
            },
            metrics,
        ));

        Self {
            config,
            telemetry,
            scheduler,
            profiles,
        }
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}

#[must_use]
pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}
