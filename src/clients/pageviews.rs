//! Wikimedia Pageviews REST client (daily top list and per-article daily series).

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    clients::{SourceError, ViewCountSource, http::{UpstreamHttp, parse_base_url}},
    pipeline::{
        title::normalize_title,
        types::{DailyViews, TopViewedEntry},
    },
};

const SOURCE: &str = "pageviews";

#[derive(Debug, Deserialize)]
struct TopResponse {
    #[serde(default)]
    items: Vec<TopItem>,
}

#[derive(Debug, Deserialize)]
struct TopItem {
    #[serde(default)]
    articles: Vec<TopArticle>,
}

#[derive(Debug, Deserialize)]
struct TopArticle {
    article: String,
    views: u64,
    rank: u32,
}

#[derive(Debug, Deserialize)]
struct PerArticleResponse {
    #[serde(default)]
    items: Vec<PerArticleItem>,
}

#[derive(Debug, Deserialize)]
struct PerArticleItem {
    /// `YYYYMMDDHH`
    timestamp: String,
    views: u64,
}

fn parse_day(timestamp: &str) -> Result<NaiveDate, SourceError> {
    timestamp
        .get(..8)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y%m%d").ok())
        .ok_or_else(|| SourceError::malformed(SOURCE, format!("bad timestamp {timestamp}")))
}

#[derive(Debug, Clone)]
pub struct PageviewsClient {
    http: UpstreamHttp,
    base_url: Url,
    project: String,
}

impl PageviewsClient {
    /// # Errors
    /// ベース URL が不正な場合はエラーを返す。
    pub(crate) fn new(base_url: &str, project: &str, http: UpstreamHttp) -> Result<Self> {
        Ok(Self {
            http,
            base_url: parse_base_url(base_url, "pageviews")?,
            project: project.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SourceError::malformed(SOURCE, "base URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ViewCountSource for PageviewsClient {
    #[instrument(skip(self))]
    async fn fetch_top_viewed(&self, date: NaiveDate) -> Result<Vec<TopViewedEntry>, SourceError> {
        let year = date.format("%Y").to_string();
        let month = date.format("%m").to_string();
        let day = date.format("%d").to_string();
        let url = self.endpoint(&["top", &self.project, "all-access", &year, &month, &day])?;

        let response: TopResponse = self
            .http
            .get_json(SOURCE, url, &format!("top views for {date}"))
            .await?;
        let entries: Vec<TopViewedEntry> = response
            .items
            .into_iter()
            .next()
            .map(|item| item.articles)
            .unwrap_or_default()
            .into_iter()
            .map(|a| TopViewedEntry {
                title: a.article,
                views: a.views,
                rank: a.rank,
            })
            .collect();
        debug!(entries = entries.len(), %date, "fetched top viewed articles");
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn fetch_daily_views(
        &self,
        title: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyViews>, SourceError> {
        let article = normalize_title(title).replace(' ', "_");
        let start_stamp = start.format("%Y%m%d00").to_string();
        let end_stamp = end.format("%Y%m%d00").to_string();
        let url = self.endpoint(&[
            "per-article",
            &self.project,
            "all-access",
            "all-agents",
            &article,
            "daily",
            &start_stamp,
            &end_stamp,
        ])?;

        let response: PerArticleResponse = self
            .http
            .get_json(SOURCE, url, &format!("views for {title}"))
            .await?;
        response
            .items
            .into_iter()
            .map(|item| {
                Ok(DailyViews {
                    date: parse_day(&item.timestamp)?,
                    views: item.views,
                })
            })
            .collect()
    }
}
