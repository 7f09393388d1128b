//! 単一記事の詳細プロファイル（正典化・係争・地位スコア）を算出する。
//!
//! 入力はすでに取得済みの `ArticleProfile` のみで、I/O は行わない。

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::pipeline::{
    revert::is_revert,
    types::{ArticleProfile, DailyViews, Revision},
};

const SCORE_MIN: f64 = 0.0;
const SCORE_MAX: f64 = 100.0;

/// Raw indicators derived from the fetched profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileIndicators {
    pub unique_editors: u32,
    pub avg_edit_size: f64,
    pub revert_count: u32,
    pub total_views: u64,
    pub avg_daily_views: f64,
    pub talk_revision_count: usize,
    pub language_link_count: usize,
    pub category_count: usize,
    pub length_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileScores {
    pub canonization: f64,
    pub contestation: f64,
    pub status: f64,
}

/// Five-axis composite shown as a radar chart, each axis in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadarAxes {
    pub canonization: f64,
    pub contestation: f64,
    pub status: f64,
    pub global_reach: f64,
    pub editor_diversity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Moderate,
    Low,
}

impl Level {
    fn from_thresholds<T: PartialOrd>(value: T, high: T, moderate: T) -> Self {
        if value > high {
            Self::High
        } else if value > moderate {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// Coarse reading of the indicators for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub global_reach: Level,
    pub revert_activity: Level,
    pub attention: Level,
    pub contestation: Level,
    pub canonization: Level,
}

/// Fully scored single-article profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredProfile {
    pub title: String,
    pub indicators: ProfileIndicators,
    pub scores: ProfileScores,
    pub axes: RadarAxes,
    pub interpretation: Interpretation,
    pub daily_views: Vec<DailyViews>,
    pub talk_page_found: bool,
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return SCORE_MIN;
    }
    value.clamp(SCORE_MIN, SCORE_MAX)
}

#[must_use]
pub fn unique_editors(revisions: &[Revision]) -> u32 {
    let editors: FxHashSet<&str> = revisions.iter().map(|r| r.editor.as_str()).collect();
    u32::try_from(editors.len()).unwrap_or(u32::MAX)
}

/// Mean absolute size change between consecutive revisions; zero below two revisions.
#[must_use]
pub fn avg_edit_size(revisions: &[Revision]) -> f64 {
    if revisions.len() < 2 {
        return 0.0;
    }
    let total: f64 = revisions
        .windows(2)
        .map(|pair| pair[1].size.abs_diff(pair[0].size) as f64)
        .sum();
    total / (revisions.len() - 1) as f64
}

#[must_use]
pub fn revert_count(revisions: &[Revision]) -> u32 {
    let count = revisions
        .iter()
        .filter(|r| is_revert(r.comment.as_deref()))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[must_use]
pub fn total_views(daily_views: &[DailyViews]) -> u64 {
    daily_views
        .iter()
        .fold(0_u64, |acc, day| acc.saturating_add(day.views))
}

#[must_use]
pub fn indicators(profile: &ArticleProfile) -> ProfileIndicators {
    let total_views = total_views(&profile.daily_views);
    let avg_daily_views = if profile.daily_views.is_empty() {
        0.0
    } else {
        total_views as f64 / profile.daily_views.len() as f64
    };

    ProfileIndicators {
        unique_editors: unique_editors(&profile.revisions),
        avg_edit_size: avg_edit_size(&profile.revisions),
        revert_count: revert_count(&profile.revisions),
        total_views,
        avg_daily_views,
        talk_revision_count: profile.talk_revision_count(),
        language_link_count: profile.language_link_count,
        category_count: profile.category_count,
        length_bytes: profile.length_bytes,
    }
}

/// `2×langs + 3×categories + min(20, 2×editors) + min(30, views/3333)`
#[must_use]
pub fn canonization_score(ind: &ProfileIndicators) -> f64 {
    let raw = 2.0 * ind.language_link_count as f64
        + 3.0 * ind.category_count as f64
        + (2.0 * f64::from(ind.unique_editors)).min(20.0)
        + (ind.total_views as f64 / 3333.0).min(30.0);
    clamp_score(raw)
}

/// `15×reverts + 2×talkRevisions + min(20, avgEditSize/50)`
#[must_use]
pub fn contestation_score(ind: &ProfileIndicators) -> f64 {
    let raw = 15.0 * f64::from(ind.revert_count)
        + 2.0 * ind.talk_revision_count as f64
        + (ind.avg_edit_size / 50.0).min(20.0);
    clamp_score(raw)
}

/// `views/5000 + 1.5×langs + min(30, lengthBytes/1666)`
#[must_use]
pub fn status_score(ind: &ProfileIndicators) -> f64 {
    let raw = ind.total_views as f64 / 5000.0
        + 1.5 * ind.language_link_count as f64
        + (ind.length_bytes as f64 / 1666.0).min(30.0);
    clamp_score(raw)
}

impl RadarAxes {
    #[must_use]
    pub fn new(ind: &ProfileIndicators, scores: ProfileScores) -> Self {
        Self {
            canonization: scores.canonization,
            contestation: scores.contestation,
            status: scores.status,
            global_reach: clamp_score(2.0 * ind.language_link_count as f64),
            editor_diversity: clamp_score(5.0 * f64::from(ind.unique_editors)),
        }
    }
}

impl Interpretation {
    #[must_use]
    pub fn new(ind: &ProfileIndicators, scores: ProfileScores) -> Self {
        Self {
            global_reach: Level::from_thresholds(ind.language_link_count, 50, 20),
            revert_activity: Level::from_thresholds(ind.revert_count, 5, 0),
            attention: Level::from_thresholds(ind.total_views, 100_000, 10_000),
            contestation: Level::from_thresholds(scores.contestation, 50.0, 25.0),
            canonization: Level::from_thresholds(scores.canonization, 70.0, 40.0),
        }
    }
}

/// 取得済みプロファイルから全スコア・レーダー軸・解釈をまとめて算出する。
#[must_use]
pub fn score_profile(profile: &ArticleProfile) -> ScoredProfile {
    let indicators = indicators(profile);
    let scores = ProfileScores {
        canonization: canonization_score(&indicators),
        contestation: contestation_score(&indicators),
        status: status_score(&indicators),
    };

    ScoredProfile {
        title: profile.title.clone(),
        axes: RadarAxes::new(&indicators, scores),
        interpretation: Interpretation::new(&indicators, scores),
        indicators,
        scores,
        daily_views: profile.daily_views.clone(),
        talk_page_found: profile.talk_revisions.is_some(),
    }
}
