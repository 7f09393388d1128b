//! Per-article aggregation of one change-feed batch.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::pipeline::{
    revert::is_revert,
    title::normalize_title,
    types::{ArticleStats, EditRecord},
};

/// バッチ内の記事ごとの統計。初出順（挿入順）を保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleStatsTable {
    entries: Vec<ArticleStats>,
    index: FxHashMap<String, usize>,
}

impl ArticleStatsTable {
    /// Looks up a title in any separator convention.
    #[must_use]
    pub fn get(&self, title: &str) -> Option<&ArticleStats> {
        let key = normalize_title(title);
        self.index.get(&key).map(|&position| &self.entries[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArticleStats> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ArticleStats] {
        &self.entries
    }
}

/// 編集レコードのバッチを記事単位に畳み込む。
///
/// 毎回バッチ全体から作り直すため、前回のパスの状態は一切参照しない。
#[must_use]
pub fn aggregate(edits: &[EditRecord]) -> ArticleStatsTable {
    let mut entries: Vec<ArticleStats> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut editors: Vec<FxHashSet<&str>> = Vec::new();

    for edit in edits {
        let title = normalize_title(&edit.title);
        if title.is_empty() {
            continue;
        }

        let existing = index.get(&title).copied();
        let position = match existing {
            Some(position) => position,
            None => {
                let position = entries.len();
                index.insert(title.clone(), position);
                entries.push(ArticleStats {
                    title,
                    edit_count: 0,
                    unique_editors: 0,
                    revert_count: 0,
                    size_churn: 0,
                });
                editors.push(FxHashSet::default());
                position
            }
        };

        let stats = &mut entries[position];
        stats.edit_count = stats.edit_count.saturating_add(1);
        if is_revert(edit.comment.as_deref()) {
            stats.revert_count = stats.revert_count.saturating_add(1);
        }
        stats.size_churn = stats
            .size_churn
            .saturating_add(edit.size_after.abs_diff(edit.size_before));

        let seen = &mut editors[position];
        if seen.insert(edit.editor.as_str()) {
            stats.unique_editors = stats.unique_editors.saturating_add(1);
        }
    }

    ArticleStatsTable { entries, index }
}

/// Total number of revert-like edits in the batch.
#[must_use]
pub fn total_reverts(table: &ArticleStatsTable) -> u64 {
    table.iter().map(|stats| u64::from(stats.revert_count)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn edit(title: &str, editor: &str, comment: Option<&str>, before: u64, after: u64) -> EditRecord {
        EditRecord {
            title: title.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            editor: editor.to_string(),
            comment: comment.map(ToString::to_string),
            size_before: before,
            size_after: after,
        }
    }

    #[test]
    fn aggregate_counts_edits_editors_reverts_and_churn() {
        let batch = vec![
            edit("Alpha", "ed1", Some("expand"), 100, 150),
            edit("Alpha", "ed2", Some("Reverted edits by ed1"), 150, 100),
            edit("Alpha", "ed1", None, 100, 90),
            edit("Beta", "ed3", Some("typo"), 10, 11),
        ];

        let table = aggregate(&batch);

        assert_eq!(table.len(), 2);
        let alpha = table.get("Alpha").expect("alpha aggregated");
        assert_eq!(alpha.edit_count, 3);
        assert_eq!(alpha.unique_editors, 2);
        assert_eq!(alpha.revert_count, 1);
        assert_eq!(alpha.size_churn, 50 + 50 + 10);

        let beta = table.get("Beta").expect("beta aggregated");
        assert_eq!(beta.edit_count, 1);
        assert_eq!(beta.unique_editors, 1);
        assert_eq!(beta.revert_count, 0);
        assert_eq!(beta.size_churn, 1);
    }

    #[test]
    fn aggregate_preserves_first_seen_order() {
        let batch = vec![
            edit("Zeta", "a", None, 0, 1),
            edit("Alpha", "b", None, 0, 1),
            edit("Zeta", "c", None, 1, 2),
            edit("Mu", "d", None, 0, 1),
        ];

        let table = aggregate(&batch);
        let titles: Vec<&str> = table.iter().map(|s| s.title.as_str()).collect();

        assert_eq!(titles, vec!["Zeta", "Alpha", "Mu"]);
    }

    #[test]
    fn aggregate_merges_separator_variants_of_one_title() {
        let batch = vec![
            edit("Climate change", "a", None, 0, 1),
            edit("Climate_change", "b", None, 1, 2),
        ];

        let table = aggregate(&batch);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Climate_change").map(|s| s.edit_count), Some(2));
    }

    #[test]
    fn aggregate_of_empty_batch_is_empty() {
        let table = aggregate(&[]);
        assert!(table.is_empty());
        assert_eq!(total_reverts(&table), 0);
    }

    #[test]
    fn total_reverts_sums_over_titles() {
        let batch = vec![
            edit("A", "x", Some("undid revision"), 0, 0),
            edit("B", "y", Some("rvv"), 0, 0),
            edit("B", "z", Some("rv spam"), 0, 0),
        ];

        assert_eq!(total_reverts(&aggregate(&batch)), 3);
    }
}
