//! 記事タイトルの正規化。
//!
//! 編集フィードは空白区切り、閲覧数 API はアンダースコア区切りで同じ記事を返すため、
//! 比較・検索の前に必ずこのモジュールで単一の表記に揃える。

/// Namespaces whose pages are never content articles.
const NON_CONTENT_NAMESPACES: &[&str] = &[
    "special",
    "media",
    "talk",
    "user",
    "user talk",
    "wikipedia",
    "wikipedia talk",
    "file",
    "file talk",
    "mediawiki",
    "mediawiki talk",
    "template",
    "template talk",
    "help",
    "help talk",
    "category",
    "category talk",
    "portal",
    "portal talk",
    "draft",
    "draft talk",
    "timedtext",
    "timedtext talk",
    "module",
    "module talk",
    "book",
    "book talk",
    "education program",
    "education program talk",
    "gadget",
    "gadget talk",
    "gadget definition",
    "gadget definition talk",
    "topic",
    // aliases
    "project",
    "project talk",
    "wp",
    "wt",
    "image",
    "image talk",
];

const FRONT_PAGE: &str = "Main Page";

/// 正規化済みのタイトルを返す（アンダースコアを空白に置換し、前後の空白を除去）。
#[must_use]
pub fn normalize_title(raw: &str) -> String {
    raw.replace('_', " ").trim().to_string()
}

/// 名前空間付きページやメインページでなければ `true` を返す。
#[must_use]
pub fn is_content_title(raw: &str) -> bool {
    let title = normalize_title(raw);
    if title.is_empty() || title == FRONT_PAGE {
        return false;
    }

    match title.split_once(':') {
        Some((prefix, _)) => {
            let prefix = prefix.trim().to_lowercase();
            !NON_CONTENT_NAMESPACES.contains(&prefix.as_str())
        }
        None => true,
    }
}
