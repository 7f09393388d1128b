pub mod error;
#[cfg(test)]
pub(crate) mod fakes;
pub(crate) mod http;
pub mod mediawiki;
pub mod pageviews;

use async_trait::async_trait;
use chrono::NaiveDate;

pub use error::SourceError;
pub use http::HttpSettings;
pub use mediawiki::MediaWikiClient;
pub use pageviews::PageviewsClient;

use crate::pipeline::types::{ArticleMetadata, DailyViews, EditRecord, Revision, TopViewedEntry};

/// Recent edits to main-namespace articles, most recent first.
#[async_trait]
pub trait ChangeFeedSource: Send + Sync {
    async fn fetch_recent_changes(&self, limit: usize) -> Result<Vec<EditRecord>, SourceError>;
}

#[async_trait]
pub trait ViewCountSource: Send + Sync {
    /// Ranked most-viewed articles for one calendar day.
    async fn fetch_top_viewed(&self, date: NaiveDate) -> Result<Vec<TopViewedEntry>, SourceError>;

    /// Daily views of one article over an inclusive date range.
    async fn fetch_daily_views(
        &self,
        title: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyViews>, SourceError>;
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Redirects are followed; a missing article is `SourceError::NotFound`.
    async fn fetch_article_metadata(
        &self,
        title: &str,
        revision_limit: usize,
    ) -> Result<ArticleMetadata, SourceError>;

    async fn fetch_talk_revisions(
        &self,
        title: &str,
        limit: usize,
    ) -> Result<Vec<Revision>, SourceError>;
}
