//! Category summarizer: groups classified topics and ranks buckets.

use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::pipeline::{
    topic::{TopicBucket, TopicClassifier},
    types::ContestedTopic,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBucket {
    pub name: TopicBucket,
    /// Full member list in contested-list order.
    pub topics: Vec<ContestedTopic>,
    /// Sum over every member, not only the preview.
    pub total_contestation_score: f64,
    preview_cap: usize,
}

impl CategoryBucket {
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Capped slice shown to the presentation layer.
    #[must_use]
    pub fn preview(&self) -> &[ContestedTopic] {
        let end = self.preview_cap.min(self.topics.len());
        &self.topics[..end]
    }
}

impl Serialize for CategoryBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CategoryBucket", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("count", &self.topic_count())?;
        state.serialize_field("topics", self.preview())?;
        state.serialize_field("total_contestation_score", &self.total_contestation_score)?;
        state.end()
    }
}

/// トピックをバケットごとにまとめ、合計係争スコアの降順に並べる。
///
/// 空のバケットは除外する。同点の場合はバケットの定義順を保つ。
#[must_use]
pub fn summarize_categories(
    topics: &[ContestedTopic],
    classifier: &TopicClassifier,
    preview_cap: usize,
) -> Vec<CategoryBucket> {
    let mut grouped: Vec<(TopicBucket, Vec<ContestedTopic>)> = TopicBucket::ALL
        .iter()
        .map(|bucket| (*bucket, Vec::new()))
        .collect();

    for topic in topics {
        let bucket = classifier.classify(&topic.title);
        if let Some((_, members)) = grouped.iter_mut().find(|(name, _)| *name == bucket) {
            members.push(topic.clone());
        }
    }

    let mut buckets: Vec<CategoryBucket> = grouped
        .into_iter()
        .filter(|(_, members)| !members.is_empty())
        .map(|(name, members)| CategoryBucket {
            name,
            total_contestation_score: members.iter().map(|t| t.contestation_score).sum(),
            topics: members,
            preview_cap,
        })
        .collect();

    buckets.sort_by(|a, b| {
        b.total_contestation_score
            .total_cmp(&a.total_contestation_score)
    });
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(title: &str, score: f64) -> ContestedTopic {
        ContestedTopic {
            title: title.to_string(),
            edit_count: 2,
            unique_editors: 1,
            revert_count: 0,
            size_churn: 0,
            contestation_score: score,
            is_edit_war: false,
        }
    }

    #[test]
    fn totals_cover_full_group_even_when_preview_is_truncated() {
        let topics: Vec<ContestedTopic> = (0..8)
            .map(|i| topic(&format!("Senate vote {i}"), 10.0))
            .collect();

        let buckets = summarize_categories(&topics, &TopicClassifier::for_year(2025), 5);

        assert_eq!(buckets.len(), 1);
        let politics = &buckets[0];
        assert_eq!(politics.name, TopicBucket::Politics);
        assert_eq!(politics.topic_count(), 8);
        assert_eq!(politics.preview().len(), 5);
        assert!((politics.total_contestation_score - 80.0).abs() < 1e-9);
    }

    #[test]
    fn buckets_are_sorted_by_total_and_empty_ones_dropped() {
        let topics = vec![
            topic("Election night", 5.0),
            topic("Climate model", 30.0),
            topic("Vaccine trial", 20.0),
            topic("Jazz music", 40.0),
        ];

        let buckets = summarize_categories(&topics, &TopicClassifier::for_year(2025), 5);

        let names: Vec<TopicBucket> = buckets.iter().map(|b| b.name).collect();
        assert_eq!(
            names,
            vec![TopicBucket::Science, TopicBucket::Culture, TopicBucket::Politics]
        );
        assert!((buckets[0].total_contestation_score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn members_keep_contested_list_order() {
        let topics = vec![
            topic("Software A", 9.0),
            topic("Software B", 7.0),
            topic("Software C", 8.0),
        ];

        let buckets = summarize_categories(&topics, &TopicClassifier::for_year(2025), 2);

        let titles: Vec<&str> = buckets[0].preview().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Software A", "Software B"]);
    }

    #[test]
    fn serialized_bucket_exposes_preview_and_count() {
        let topics: Vec<ContestedTopic> = (0..3)
            .map(|i| topic(&format!("Party congress {i}"), 1.0))
            .collect();
        let buckets = summarize_categories(&topics, &TopicClassifier::for_year(2025), 1);

        let json = serde_json::to_value(&buckets[0]).expect("serializes");

        assert_eq!(json["name"], "Politics & Governance");
        assert_eq!(json["count"], 3);
        assert_eq!(json["topics"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["total_contestation_score"], 3.0);
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        assert!(summarize_categories(&[], &TopicClassifier::for_year(2025), 5).is_empty());
    }
}
