//! Contestation scoring and edit-war detection for the periodic pass.

use serde::{Deserialize, Serialize};

use crate::pipeline::{
    aggregate::ArticleStatsTable,
    types::{ArticleStats, ContestedTopic},
};

/// Titles edited fewer times than this carry no contestation signal.
pub const MIN_EDITS_FOR_CONTESTATION: u32 = 2;
pub const EDIT_WAR_MIN_REVERTS: u32 = 2;
pub const EDIT_WAR_MIN_EDITS: u32 = 5;
pub const EDIT_WAR_MIN_EDITORS: u32 = 3;
pub const HIGH_CHURN_BYTES: u64 = 5000;
pub const MULTI_EDITOR_MIN: u32 = 3;

/// `edits × √editors × (1 + 3 × reverts)`
#[must_use]
pub fn contestation_score(stats: &ArticleStats) -> f64 {
    let edits = f64::from(stats.edit_count);
    let editors = f64::from(stats.unique_editors);
    let reverts = f64::from(stats.revert_count);
    edits * editors.sqrt() * (1.0 + 3.0 * reverts)
}

/// Either clear reverting, or high-volume editing by several parties.
#[must_use]
pub fn is_edit_war(stats: &ArticleStats) -> bool {
    stats.revert_count >= EDIT_WAR_MIN_REVERTS
        || (stats.edit_count >= EDIT_WAR_MIN_EDITS
            && stats.unique_editors >= EDIT_WAR_MIN_EDITORS)
}

impl From<&ArticleStats> for ContestedTopic {
    fn from(stats: &ArticleStats) -> Self {
        Self {
            title: stats.title.clone(),
            edit_count: stats.edit_count,
            unique_editors: stats.unique_editors,
            revert_count: stats.revert_count,
            size_churn: stats.size_churn,
            contestation_score: contestation_score(stats),
            is_edit_war: is_edit_war(stats),
        }
    }
}

/// 係争スコアの降順に並べた係争記事リストを返す。
///
/// 編集 1 回の記事は除外し、同点は集計時の挿入順を保つ（安定ソート）。
#[must_use]
pub fn rank_contested(table: &ArticleStatsTable, cap: usize) -> Vec<ContestedTopic> {
    let mut topics: Vec<ContestedTopic> = table
        .iter()
        .filter(|stats| stats.edit_count >= MIN_EDITS_FOR_CONTESTATION)
        .map(ContestedTopic::from)
        .collect();

    topics.sort_by(|a, b| b.contestation_score.total_cmp(&a.contestation_score));
    topics.truncate(cap);
    topics
}

/// Subset of the ranked list flagged as edit wars, same relative order.
#[must_use]
pub fn edit_wars(topics: &[ContestedTopic]) -> Vec<ContestedTopic> {
    topics.iter().filter(|t| t.is_edit_war).cloned().collect()
}

/// Titles with the most edits in the batch, regardless of contestation.
#[must_use]
pub fn trending_by_edits(table: &ArticleStatsTable, cap: usize) -> Vec<ArticleStats> {
    let mut trending: Vec<ArticleStats> = table.iter().cloned().collect();
    trending.sort_by(|a, b| b.edit_count.cmp(&a.edit_count));
    trending.truncate(cap);
    trending
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicFilter {
    #[default]
    All,
    EditWars,
    HighChurn,
    MultiEditor,
}

impl TopicFilter {
    #[must_use]
    pub fn matches(self, topic: &ContestedTopic) -> bool {
        match self {
            Self::All => true,
            Self::EditWars => topic.is_edit_war,
            Self::HighChurn => topic.size_churn > HIGH_CHURN_BYTES,
            Self::MultiEditor => topic.unique_editors >= MULTI_EDITOR_MIN,
        }
    }

    #[must_use]
    pub fn apply(self, topics: &[ContestedTopic]) -> Vec<ContestedTopic> {
        topics.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}
