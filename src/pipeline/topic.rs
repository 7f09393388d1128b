//! 係争記事のトピック分類（キーワードヒューリスティック）。
//!
//! ルールは (述語, バケット) の順序付きリストで、先に一致したものが採用される。
//! キーワード集合は互いに重なるため、評価順そのものが分類結果の一部になる。
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::pipeline::title::normalize_title;

/// Two capitalised words, e.g. "Jane Doe".
static PERSON_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+ [A-Z][a-z]+$").expect("person name pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TopicBucket {
    #[serde(rename = "Politics & Governance")]
    Politics,
    #[serde(rename = "Science & Technology")]
    Science,
    #[serde(rename = "Culture & Society")]
    Culture,
    #[serde(rename = "People & Biography")]
    People,
    #[serde(rename = "Current Events")]
    CurrentEvents,
    #[serde(rename = "Other")]
    Other,
}

impl TopicBucket {
    /// Every bucket in rule-evaluation order.
    pub const ALL: [TopicBucket; 6] = [
        TopicBucket::Politics,
        TopicBucket::Science,
        TopicBucket::Culture,
        TopicBucket::People,
        TopicBucket::CurrentEvents,
        TopicBucket::Other,
    ];

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Politics => "Politics & Governance",
            Self::Science => "Science & Technology",
            Self::Culture => "Culture & Society",
            Self::People => "People & Biography",
            Self::CurrentEvents => "Current Events",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for TopicBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Keyword {
    /// Matches anywhere inside the lower-cased title.
    Substring(String),
    /// Matches only as a whole word; used for short tokens like "ai".
    Word(String),
}

impl Keyword {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            Self::Substring(needle) => lowered.contains(needle.as_str()),
            Self::Word(needle) => contains_word(lowered, needle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    AnyKeyword(Vec<Keyword>),
    PersonName,
    Either(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    fn matches(&self, title: &str, lowered: &str) -> bool {
        match self {
            Self::AnyKeyword(keywords) => keywords.iter().any(|k| k.matches(lowered)),
            Self::PersonName => PERSON_NAME.is_match(title),
            Self::Either(left, right) => {
                left.matches(title, lowered) || right.matches(title, lowered)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TopicRule {
    bucket: TopicBucket,
    predicate: Predicate,
}

/// First-match-wins topic classifier. Total: unmatched titles land in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicClassifier {
    rules: Vec<TopicRule>,
}

impl TopicClassifier {
    /// 基準年（通常はパス実行時の年）から「時事」扱いする年を決めて分類器を構築する。
    #[must_use]
    pub fn for_year(reference_year: i32) -> Self {
        let years = [reference_year - 1, reference_year];
        let mut current_events: Vec<Keyword> = years
            .iter()
            .map(|year| Keyword::Substring(year.to_string()))
            .collect();
        current_events.extend(substrings(&[
            "attack",
            "earthquake",
            "storm",
            "shooting",
        ]));

        let rules = vec![
            TopicRule {
                bucket: TopicBucket::Politics,
                predicate: Predicate::AnyKeyword(substrings(&[
                    "election",
                    "president",
                    "government",
                    "party",
                    "minister",
                    "congress",
                    "senate",
                    "law",
                    "political",
                ])),
            },
            TopicRule {
                bucket: TopicBucket::Science,
                predicate: Predicate::AnyKeyword(
                    std::iter::once(Keyword::Word("ai".to_string()))
                        .chain(substrings(&[
                            "technology",
                            "software",
                            "science",
                            "research",
                            "study",
                            "climate",
                            "medical",
                            "vaccine",
                        ]))
                        .collect(),
                ),
            },
            TopicRule {
                bucket: TopicBucket::Culture,
                predicate: Predicate::AnyKeyword(
                    std::iter::once(Keyword::Word("art".to_string()))
                        .chain(substrings(&[
                            "film",
                            "album",
                            "series",
                            "show",
                            "music",
                            "culture",
                            "religion",
                            "sport",
                        ]))
                        .collect(),
                ),
            },
            TopicRule {
                bucket: TopicBucket::People,
                predicate: Predicate::Either(
                    Box::new(Predicate::PersonName),
                    Box::new(Predicate::AnyKeyword(substrings(&["death of", "biography"]))),
                ),
            },
            TopicRule {
                bucket: TopicBucket::CurrentEvents,
                predicate: Predicate::AnyKeyword(current_events),
            },
        ];

        Self { rules }
    }

    /// Keywords are matched against the lower-cased title; the person-name
    /// pattern against the normalized original casing.
    #[must_use]
    pub fn classify(&self, title: &str) -> TopicBucket {
        let title = normalize_title(title);
        let lowered = title.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(&title, &lowered))
            .map_or(TopicBucket::Other, |rule| rule.bucket)
    }
}

fn substrings(words: &[&str]) -> Vec<Keyword> {
    words
        .iter()
        .map(|word| Keyword::Substring((*word).to_string()))
        .collect()
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}
