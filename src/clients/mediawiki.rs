//! MediaWiki Action API クライアント（変更フィード・記事メタデータ・ノートページ）。

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::{
    clients::{ArticleSource, ChangeFeedSource, SourceError, http::UpstreamHttp},
    pipeline::{
        title::normalize_title,
        types::{ArticleMetadata, EditRecord, Revision},
    },
};

const SOURCE: &str = "mediawiki";
/// Editor identity used when the username is suppressed.
pub const HIDDEN_EDITOR: &str = "(hidden)";
/// Upper bound accepted by the API for non-bot accounts.
const MAX_RECENT_CHANGES: usize = 500;

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    query: Option<T>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

#[derive(Debug, Deserialize)]
struct RecentChangesQuery {
    #[serde(default)]
    recentchanges: Vec<RawChange>,
}

#[derive(Debug, Deserialize)]
struct RawChange {
    title: String,
    timestamp: DateTime<Utc>,
    user: Option<String>,
    comment: Option<String>,
    oldlen: Option<u64>,
    newlen: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    length: Option<u64>,
    #[serde(default)]
    revisions: Vec<RawRevision>,
    #[serde(default)]
    categories: Vec<RawCategory>,
    #[serde(default)]
    langlinks: Vec<RawLangLink>,
}

#[derive(Debug, Deserialize)]
struct RawRevision {
    timestamp: DateTime<Utc>,
    user: Option<String>,
    comment: Option<String>,
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    title: String,
}

#[derive(Debug, Deserialize)]
struct RawLangLink {
    lang: String,
}

fn editor_or_hidden(user: Option<String>) -> String {
    user.filter(|u| !u.is_empty())
        .unwrap_or_else(|| HIDDEN_EDITOR.to_string())
}

fn non_empty(comment: Option<String>) -> Option<String> {
    comment.filter(|c| !c.is_empty())
}

impl From<RawChange> for EditRecord {
    fn from(raw: RawChange) -> Self {
        Self {
            title: normalize_title(&raw.title),
            timestamp: raw.timestamp,
            editor: editor_or_hidden(raw.user),
            comment: non_empty(raw.comment),
            size_before: raw.oldlen.unwrap_or(0),
            size_after: raw.newlen.unwrap_or(0),
        }
    }
}

impl From<RawRevision> for Revision {
    fn from(raw: RawRevision) -> Self {
        Self {
            timestamp: raw.timestamp,
            editor: editor_or_hidden(raw.user),
            comment: non_empty(raw.comment),
            size: raw.size.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaWikiClient {
    http: UpstreamHttp,
    api_url: Url,
}

impl MediaWikiClient {
    /// # Errors
    /// API の URL が不正な場合はエラーを返す。
    pub(crate) fn new(api_url: &str, http: UpstreamHttp) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .with_context(|| format!("invalid MediaWiki API URL: {api_url}"))?;
        Ok(Self { http, api_url })
    }

    fn query_url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.api_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("action", "query");
            pairs.append_pair("format", "json");
            pairs.append_pair("formatversion", "2");
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn query<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, SourceError> {
        let envelope: ApiEnvelope<T> = self.http.get_json(SOURCE, url, what).await?;
        if let Some(error) = envelope.error {
            return Err(SourceError::UpstreamUnavailable {
                source_name: SOURCE,
                detail: format!("{}: {}", error.code, error.info),
                retryable: false,
            });
        }
        envelope
            .query
            .ok_or_else(|| SourceError::malformed(SOURCE, "response has no query object"))
    }

    /// 単一ページの問い合わせ。存在しない・不正なタイトルは `NotFound`。
    async fn single_page(&self, url: Url, what: &str) -> Result<RawPage, SourceError> {
        let query: PagesQuery = self.query(url, what).await?;
        let page = query
            .pages
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::malformed(SOURCE, "response has no pages"))?;
        if page.missing || page.invalid {
            return Err(SourceError::not_found(what));
        }
        Ok(page)
    }
}

#[async_trait]
impl ChangeFeedSource for MediaWikiClient {
    #[instrument(skip(self))]
    async fn fetch_recent_changes(&self, limit: usize) -> Result<Vec<EditRecord>, SourceError> {
        let limit = limit.clamp(1, MAX_RECENT_CHANGES).to_string();
        let url = self.query_url(&[
            ("list", "recentchanges"),
            ("rcnamespace", "0"),
            ("rctype", "edit"),
            ("rcprop", "title|timestamp|user|comment|sizes"),
            ("rclimit", limit.as_str()),
        ]);

        let query: RecentChangesQuery = self.query(url, "recent changes").await?;
        let edits: Vec<EditRecord> = query
            .recentchanges
            .into_iter()
            .map(EditRecord::from)
            .collect();
        debug!(edits = edits.len(), "fetched recent changes");
        Ok(edits)
    }
}

#[async_trait]
impl ArticleSource for MediaWikiClient {
    #[instrument(skip(self))]
    async fn fetch_article_metadata(
        &self,
        title: &str,
        revision_limit: usize,
    ) -> Result<ArticleMetadata, SourceError> {
        let title = normalize_title(title);
        let what = format!("article {title}");
        let limit = revision_limit.max(1).to_string();
        let url = self.query_url(&[
            ("titles", title.as_str()),
            ("redirects", "1"),
            ("prop", "info|revisions|categories|langlinks"),
            ("rvprop", "timestamp|user|comment|size"),
            ("rvlimit", limit.as_str()),
            ("cllimit", "max"),
            ("lllimit", "max"),
        ]);

        let page = self.single_page(url, &what).await?;
        let length_bytes = page
            .length
            .ok_or_else(|| SourceError::malformed(SOURCE, "page has no length"))?;

        Ok(ArticleMetadata {
            title: page.title,
            length_bytes,
            categories: page.categories.into_iter().map(|c| c.title).collect(),
            language_links: page.langlinks.into_iter().map(|l| l.lang).collect(),
            revisions: page.revisions.into_iter().map(Revision::from).collect(),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_talk_revisions(
        &self,
        title: &str,
        limit: usize,
    ) -> Result<Vec<Revision>, SourceError> {
        let talk_title = format!("Talk:{}", normalize_title(title));
        let what = format!("talk page {talk_title}");
        let limit = limit.max(1).to_string();
        let url = self.query_url(&[
            ("titles", talk_title.as_str()),
            ("prop", "revisions"),
            ("rvprop", "timestamp|user|comment|size"),
            ("rvlimit", limit.as_str()),
        ]);

        let page = self.single_page(url, &what).await?;
        Ok(page.revisions.into_iter().map(Revision::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::http::test_support::upstream;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> MediaWikiClient {
        MediaWikiClient::new(&format!("{}/w/api.php", server.uri()), upstream())
            .expect("client builds")
    }

    #[tokio::test]
    async fn fetch_recent_changes_maps_rows() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "batchcomplete": true,
            "query": {
                "recentchanges": [
                    {
                        "type": "edit", "ns": 0, "title": "Climate_change",
                        "timestamp": "2025-03-01T12:00:00Z", "user": "Alice",
                        "comment": "Undid revision 1", "oldlen": 1200, "newlen": 1000
                    },
                    {
                        "type": "edit", "ns": 0, "title": "Pop art",
                        "timestamp": "2025-03-01T11:59:00Z", "userhidden": true,
                        "comment": "", "oldlen": 10
                    }
                ]
            }
        });
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "recentchanges"))
            .and(query_param("rcnamespace", "0"))
            .and(query_param("rclimit", "500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let edits = client(&server)
            .fetch_recent_changes(2_000)
            .await
            .expect("fetch succeeds");

        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].title, "Climate change");
        assert_eq!(edits[0].editor, "Alice");
        assert_eq!(edits[0].size_delta(), -200);
        assert_eq!(edits[1].editor, HIDDEN_EDITOR);
        assert_eq!(edits[1].comment, None);
        assert_eq!(edits[1].size_after, 0);
    }

    #[tokio::test]
    async fn fetch_recent_changes_rejects_missing_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"batchcomplete": true})))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_recent_changes(10)
            .await
            .expect_err("should fail");

        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn fetch_article_metadata_follows_redirect() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "query": {
                "redirects": [{"from": "UK", "to": "United Kingdom"}],
                "pages": [{
                    "pageid": 31717, "ns": 0, "title": "United Kingdom", "length": 250000,
                    "revisions": [
                        {"timestamp": "2025-03-01T10:00:00Z", "user": "A", "comment": "rv", "size": 250000},
                        {"timestamp": "2025-02-28T10:00:00Z", "user": "B", "comment": "expand", "size": 249000}
                    ],
                    "categories": [{"ns": 14, "title": "Category:Countries in Europe"}],
                    "langlinks": [{"lang": "fr", "title": "Royaume-Uni"}, {"lang": "de", "title": "Vereinigtes Königreich"}]
                }]
            }
        });
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("titles", "UK"))
            .and(query_param("redirects", "1"))
            .and(query_param("rvlimit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let metadata = client(&server)
            .fetch_article_metadata("UK", 50)
            .await
            .expect("fetch succeeds");

        assert_eq!(metadata.title, "United Kingdom");
        assert_eq!(metadata.length_bytes, 250_000);
        assert_eq!(metadata.categories, vec!["Category:Countries in Europe"]);
        assert_eq!(metadata.language_links, vec!["fr", "de"]);
        assert_eq!(metadata.revisions.len(), 2);
        assert_eq!(metadata.revisions[1].size, 249_000);
    }

    #[tokio::test]
    async fn fetch_article_metadata_reports_missing_page_as_not_found() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "query": {"pages": [{"ns": 0, "title": "Nonexistent thing", "missing": true}]}
        });
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_article_metadata("Nonexistent_thing", 50)
            .await
            .expect_err("should be not found");

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn fetch_talk_revisions_queries_talk_namespace() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "query": {"pages": [{
                "pageid": 5, "ns": 1, "title": "Talk:Pop art",
                "revisions": [{"timestamp": "2025-01-01T00:00:00Z", "user": "C", "comment": "reply", "size": 900}]
            }]}
        });
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("titles", "Talk:Pop art"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let revisions = client(&server)
            .fetch_talk_revisions("Pop_art", 30)
            .await
            .expect("fetch succeeds");

        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].editor, "C");
    }

    #[tokio::test]
    async fn api_errors_are_not_retried() {
        let server = MockServer::start().await;
        let body = serde_json::json!({"error": {"code": "badvalue", "info": "Unrecognized value"}});
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_recent_changes(10)
            .await
            .expect_err("should fail");

        assert!(matches!(err, SourceError::UpstreamUnavailable { retryable: false, .. }));
    }
}
