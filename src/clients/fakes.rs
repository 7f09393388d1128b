//! In-memory sources for orchestrator and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    clients::{ArticleSource, ChangeFeedSource, SourceError, ViewCountSource},
    pipeline::types::{ArticleMetadata, DailyViews, EditRecord, Revision, TopViewedEntry},
};

#[derive(Debug, Clone)]
pub(crate) enum Canned<T> {
    Ok(T),
    NotFound,
    Unavailable,
    Malformed,
    /// Never resolves.
    Hang,
}

impl<T: Clone + Send + Sync> Canned<T> {
    async fn resolve(&self, what: &str) -> Result<T, SourceError> {
        match self {
            Self::Ok(value) => Ok(value.clone()),
            Self::NotFound => Err(SourceError::not_found(what)),
            Self::Unavailable => Err(SourceError::unavailable("fake", "connection refused")),
            Self::Malformed => Err(SourceError::malformed("fake", "unexpected shape")),
            Self::Hang => std::future::pending().await,
        }
    }
}

pub(crate) struct FakeFeed {
    pub(crate) edits: Canned<Vec<EditRecord>>,
    pub(crate) calls: AtomicUsize,
}

impl FakeFeed {
    pub(crate) fn new(edits: Canned<Vec<EditRecord>>) -> Self {
        Self {
            edits,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChangeFeedSource for FakeFeed {
    async fn fetch_recent_changes(&self, limit: usize) -> Result<Vec<EditRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut edits = self.edits.resolve("recent changes").await?;
        edits.truncate(limit);
        Ok(edits)
    }
}

pub(crate) struct FakeViews {
    pub(crate) top: Canned<Vec<TopViewedEntry>>,
    pub(crate) daily: Canned<Vec<DailyViews>>,
}

#[async_trait]
impl ViewCountSource for FakeViews {
    async fn fetch_top_viewed(&self, _date: NaiveDate) -> Result<Vec<TopViewedEntry>, SourceError> {
        self.top.resolve("top views").await
    }

    async fn fetch_daily_views(
        &self,
        title: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<DailyViews>, SourceError> {
        self.daily.resolve(&format!("views for {title}")).await
    }
}

pub(crate) struct FakeArticles {
    pub(crate) metadata: Canned<ArticleMetadata>,
    pub(crate) talk: Canned<Vec<Revision>>,
}

#[async_trait]
impl ArticleSource for FakeArticles {
    async fn fetch_article_metadata(
        &self,
        title: &str,
        _revision_limit: usize,
    ) -> Result<ArticleMetadata, SourceError> {
        self.metadata.resolve(&format!("article {title}")).await
    }

    async fn fetch_talk_revisions(
        &self,
        title: &str,
        _limit: usize,
    ) -> Result<Vec<Revision>, SourceError> {
        self.talk.resolve(&format!("talk page {title}")).await
    }
}
