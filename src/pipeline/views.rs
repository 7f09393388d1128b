//! View cross-reference: marks top-viewed articles that are also being contested.

use crate::pipeline::{
    aggregate::ArticleStatsTable,
    contestation::MIN_EDITS_FOR_CONTESTATION,
    title::{is_content_title, normalize_title},
    types::{TopViewedEntry, ViewedArticle},
};

/// 閲覧数ランキングと編集統計を突き合わせる。
///
/// 名前空間付きのページとメインページを先に取り除いてから `cap` 件に絞る。
/// タイトルは正規化済みの表記で返す。
#[must_use]
pub fn cross_reference(
    top_viewed: &[TopViewedEntry],
    table: &ArticleStatsTable,
    cap: usize,
) -> Vec<ViewedArticle> {
    top_viewed
        .iter()
        .filter(|entry| is_content_title(&entry.title))
        .take(cap)
        .map(|entry| {
            let title = normalize_title(&entry.title);
            let is_contested = table
                .get(&title)
                .is_some_and(|stats| stats.edit_count >= MIN_EDITS_FOR_CONTESTATION);
            ViewedArticle {
                title,
                views: entry.views,
                rank: entry.rank,
                is_contested,
            }
        })
        .collect()
}
