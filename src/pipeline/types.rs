//! Data model shared by the radar engine and its upstream sources.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Display caps applied by the engine. Passed explicitly into every pure stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RadarLimits {
    pub contested_cap: usize,
    pub category_preview_cap: usize,
    pub top_viewed_cap: usize,
    pub trending_cap: usize,
    pub recent_feed_cap: usize,
}

impl Default for RadarLimits {
    fn default() -> Self {
        Self {
            contested_cap: 30,
            category_preview_cap: 5,
            top_viewed_cap: 20,
            trending_cap: 10,
            recent_feed_cap: 50,
        }
    }
}

/// One observed edit from the change feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditRecord {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub editor: String,
    pub comment: Option<String>,
    pub size_before: u64,
    pub size_after: u64,
}

impl EditRecord {
    #[must_use]
    pub fn size_delta(&self) -> i64 {
        let after = i64::try_from(self.size_after).unwrap_or(i64::MAX);
        let before = i64::try_from(self.size_before).unwrap_or(i64::MAX);
        after.saturating_sub(before)
    }
}

/// Per-title statistics folded from one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleStats {
    pub title: String,
    pub edit_count: u32,
    pub unique_editors: u32,
    pub revert_count: u32,
    pub size_churn: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContestedTopic {
    pub title: String,
    pub edit_count: u32,
    pub unique_editors: u32,
    pub revert_count: u32,
    pub size_churn: u64,
    pub contestation_score: f64,
    pub is_edit_war: bool,
}

/// One row of the upstream "top viewed" ranking, before cross-referencing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopViewedEntry {
    pub title: String,
    pub views: u64,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewedArticle {
    pub title: String,
    pub views: u64,
    pub rank: u32,
    pub is_contested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyViews {
    pub date: NaiveDate,
    pub views: u64,
}

/// A single revision of an article or of its talk page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    pub timestamp: DateTime<Utc>,
    pub editor: String,
    pub comment: Option<String>,
    pub size: u64,
}

/// Metadata returned by the article source for an existing article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleMetadata {
    /// Title after redirect resolution.
    pub title: String,
    pub length_bytes: u64,
    pub categories: Vec<String>,
    pub language_links: Vec<String>,
    pub revisions: Vec<Revision>,
}

/// Raw inputs of the deep-profile scorer for one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleProfile {
    pub title: String,
    pub length_bytes: u64,
    pub category_count: usize,
    pub language_link_count: usize,
    pub revisions: Vec<Revision>,
    pub daily_views: Vec<DailyViews>,
    pub talk_revisions: Option<Vec<Revision>>,
}

impl ArticleProfile {
    #[must_use]
    pub fn from_metadata(
        metadata: ArticleMetadata,
        daily_views: Vec<DailyViews>,
        talk_revisions: Option<Vec<Revision>>,
    ) -> Self {
        Self {
            title: metadata.title,
            length_bytes: metadata.length_bytes,
            category_count: metadata.categories.len(),
            language_link_count: metadata.language_links.len(),
            revisions: metadata.revisions,
            daily_views,
            talk_revisions,
        }
    }

    #[must_use]
    pub fn talk_revision_count(&self) -> usize {
        self.talk_revisions.as_ref().map_or(0, Vec::len)
    }
}
