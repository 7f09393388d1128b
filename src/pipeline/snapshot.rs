//! Immutable result of one periodic pass and the board that publishes the latest one.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::pipeline::{
    aggregate::{aggregate, total_reverts},
    categories::{CategoryBucket, summarize_categories},
    contestation::{edit_wars, rank_contested, trending_by_edits},
    revert::is_revert,
    title::normalize_title,
    topic::TopicClassifier,
    types::{ArticleStats, ContestedTopic, EditRecord, RadarLimits, TopViewedEntry, ViewedArticle},
    views::cross_reference,
};

/// Batch-level counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub total_edits: usize,
    pub articles: usize,
    pub contested: usize,
    pub edit_wars: usize,
    pub total_reverts: u64,
}

/// One row of the live edit feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveEdit {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub editor: String,
    pub comment: Option<String>,
    pub size_delta: i64,
    pub is_revert: bool,
}

impl From<&EditRecord> for LiveEdit {
    fn from(edit: &EditRecord) -> Self {
        Self {
            title: normalize_title(&edit.title),
            timestamp: edit.timestamp,
            editor: edit.editor.clone(),
            comment: edit.comment.clone(),
            size_delta: edit.size_delta(),
            is_revert: is_revert(edit.comment.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarSnapshot {
    pub pass_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub stats: PassStats,
    pub contested: Vec<ContestedTopic>,
    pub edit_wars: Vec<ContestedTopic>,
    pub categories: Vec<CategoryBucket>,
    pub top_viewed: Vec<ViewedArticle>,
    pub trending: Vec<ArticleStats>,
    pub recent_edits: Vec<LiveEdit>,
    /// Set when the view source failed and `top_viewed` is empty for that reason.
    pub views_degraded: bool,
}

/// Everything one pass fetched, handed to the pure snapshot builder.
#[derive(Debug, Clone, Copy)]
pub struct PassInputs<'a> {
    pub pass_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub edits: &'a [EditRecord],
    pub top_viewed: &'a [TopViewedEntry],
    pub views_degraded: bool,
}

/// 取得済みの入力からスナップショットを組み立てる。
///
/// 前回のパスの結果は参照せず、同じ入力からは常に同じ結果を返す。
#[must_use]
pub fn build_snapshot(inputs: PassInputs<'_>, limits: &RadarLimits) -> RadarSnapshot {
    let table = aggregate(inputs.edits);
    let contested = rank_contested(&table, limits.contested_cap);
    let wars = edit_wars(&contested);
    let classifier = TopicClassifier::for_year(inputs.generated_at.year());
    let categories = summarize_categories(&contested, &classifier, limits.category_preview_cap);
    let top_viewed = cross_reference(inputs.top_viewed, &table, limits.top_viewed_cap);
    let trending = trending_by_edits(&table, limits.trending_cap);
    let recent_edits = inputs
        .edits
        .iter()
        .take(limits.recent_feed_cap)
        .map(LiveEdit::from)
        .collect();

    let stats = PassStats {
        total_edits: inputs.edits.len(),
        articles: table.len(),
        contested: contested.len(),
        edit_wars: wars.len(),
        total_reverts: total_reverts(&table),
    };

    RadarSnapshot {
        pass_id: inputs.pass_id,
        generated_at: inputs.generated_at,
        stats,
        contested,
        edit_wars: wars,
        categories,
        top_viewed,
        trending,
        recent_edits,
        views_degraded: inputs.views_degraded,
    }
}

/// Holds the most recently published snapshot. Readers never block writers.
#[derive(Debug, Clone)]
pub struct SnapshotBoard {
    sender: Arc<watch::Sender<Option<Arc<RadarSnapshot>>>>,
}

impl Default for SnapshotBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBoard {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publishes `snapshot` unless a snapshot generated later is already on the board.
    /// Returns whether the board changed.
    pub fn publish(&self, snapshot: impl Into<Arc<RadarSnapshot>>) -> bool {
        let snapshot = snapshot.into();
        self.sender.send_if_modified(|current| {
            let newer = current
                .as_ref()
                .is_none_or(|existing| snapshot.generated_at >= existing.generated_at);
            if newer {
                *current = Some(Arc::clone(&snapshot));
            }
            newer
        })
    }

    #[must_use]
    pub fn latest(&self) -> Option<Arc<RadarSnapshot>> {
        self.sender.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<RadarSnapshot>>> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn edit(title: &str, editor: &str, comment: Option<&str>, before: u64, after: u64) -> EditRecord {
        EditRecord {
            title: title.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 4, 2, 9, 30, 0).unwrap(),
            editor: editor.to_string(),
            comment: comment.map(ToString::to_string),
            size_before: before,
            size_after: after,
        }
    }

    fn inputs<'a>(edits: &'a [EditRecord], top: &'a [TopViewedEntry]) -> PassInputs<'a> {
        PassInputs {
            pass_id: Uuid::nil(),
            generated_at: Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap(),
            edits,
            top_viewed: top,
            views_degraded: false,
        }
    }

    fn batch() -> Vec<EditRecord> {
        vec![
            edit("Election_law", "a", Some("Undid revision 5"), 500, 300),
            edit("Election law", "b", Some("rvv"), 300, 500),
            edit("Election law", "c", None, 500, 520),
            edit("Pop art", "d", None, 10, 40),
            edit("Pop art", "e", None, 40, 80),
            edit("Lonely page", "f", None, 0, 5),
        ]
    }

    #[test]
    fn build_snapshot_assembles_every_section() {
        let edits = batch();
        let top = vec![
            TopViewedEntry {
                title: "Main_Page".to_string(),
                views: 1_000_000,
                rank: 1,
            },
            TopViewedEntry {
                title: "Pop_art".to_string(),
                views: 5_000,
                rank: 2,
            },
        ];

        let snapshot = build_snapshot(inputs(&edits, &top), &RadarLimits::default());

        assert_eq!(
            snapshot.stats,
            PassStats {
                total_edits: 6,
                articles: 3,
                contested: 2,
                edit_wars: 1,
                total_reverts: 2,
            }
        );
        assert_eq!(snapshot.contested[0].title, "Election law");
        assert_eq!(snapshot.edit_wars.len(), 1);
        assert_eq!(snapshot.categories[0].name, crate::pipeline::topic::TopicBucket::Politics);
        assert_eq!(snapshot.top_viewed.len(), 1);
        assert!(snapshot.top_viewed[0].is_contested);
        assert_eq!(snapshot.trending[0].title, "Election law");
        assert_eq!(snapshot.recent_edits.len(), 6);
        assert_eq!(snapshot.recent_edits[0].size_delta, -200);
        assert!(snapshot.recent_edits[0].is_revert);
        assert!(!snapshot.views_degraded);
    }

    #[test]
    fn recent_feed_respects_cap() {
        let edits = batch();
        let limits = RadarLimits {
            recent_feed_cap: 2,
            ..RadarLimits::default()
        };

        let snapshot = build_snapshot(inputs(&edits, &[]), &limits);

        assert_eq!(snapshot.recent_edits.len(), 2);
        assert_eq!(snapshot.recent_edits[0].title, "Election law");
    }

    #[test]
    fn build_snapshot_is_deterministic() {
        let edits = batch();
        let first = build_snapshot(inputs(&edits, &[]), &RadarLimits::default());
        let second = build_snapshot(inputs(&edits, &[]), &RadarLimits::default());

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.contested).expect("serializes"),
            serde_json::to_string(&second.contested).expect("serializes")
        );
    }

    #[test]
    fn board_starts_empty_and_keeps_latest() {
        let board = SnapshotBoard::new();
        assert!(board.latest().is_none());

        let edits = batch();
        let mut first = build_snapshot(inputs(&edits, &[]), &RadarLimits::default());
        first.pass_id = Uuid::from_u128(1);
        let mut second = first.clone();
        second.pass_id = Uuid::from_u128(2);

        assert!(board.publish(first));
        assert!(board.publish(second));

        assert_eq!(board.latest().map(|s| s.pass_id), Some(Uuid::from_u128(2)));
    }

    #[test]
    fn board_ignores_snapshots_older_than_current() {
        let board = SnapshotBoard::new();
        let edits = batch();
        let newer = build_snapshot(inputs(&edits, &[]), &RadarLimits::default());
        let mut older = newer.clone();
        older.pass_id = Uuid::from_u128(9);
        older.generated_at = newer.generated_at - chrono::Duration::minutes(1);

        assert!(board.publish(newer));
        assert!(!board.publish(older));

        assert_eq!(board.latest().map(|s| s.pass_id), Some(Uuid::nil()));
    }

    #[tokio::test]
    async fn subscribers_observe_new_snapshots() {
        let board = SnapshotBoard::new();
        let mut receiver = board.subscribe();

        let edits = batch();
        board.publish(build_snapshot(inputs(&edits, &[]), &RadarLimits::default()));

        receiver.changed().await.expect("board alive");
        assert!(receiver.borrow().is_some());
    }
}
