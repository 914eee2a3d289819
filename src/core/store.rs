//! PostgREST-backed persistence for saved videos, channels and keyword
//! results. Every method maps HTTP failures into `Error::Persistence`;
//! the core never sees raw transport errors from here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::models::keyword::KeywordCandidate;
use crate::core::models::video::{ChannelRecord, VideoRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAssetRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub subscriber_count: u64,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
}

impl VideoAssetRow {
    pub fn from_record(video: &VideoRecord) -> Self {
        Self {
            id: None,
            video_id: video.id.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            thumbnail: video.thumbnail.clone(),
            channel_title: video.channel_title.clone(),
            channel_id: video.channel_id.clone(),
            subscriber_count: video.subscriber_count,
            view_count: video.view_count,
            like_count: video.like_count,
            comment_count: video.comment_count,
            duration: video.duration.clone(),
            published_at: video.published_at.map(|d| d.to_rfc3339()),
            tags: video.tags.clone(),
            category: video.category.clone(),
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAssetRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub channel_id: String,
    pub channel_title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub subscriber_count: u64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
}

impl ChannelAssetRow {
    pub fn from_record(channel: &ChannelRecord) -> Self {
        Self {
            id: None,
            channel_id: channel.channel_id.clone(),
            channel_title: channel.channel_title.clone(),
            thumbnail: channel.thumbnail.clone(),
            subscriber_count: channel.subscriber_count,
            category: channel.category.clone(),
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub keyword: String,
    #[serde(default)]
    pub keyword_type: String,
    #[serde(default)]
    pub trend: Option<String>,
}

/// Join row between a saved video and a keyword. Upserted so re-running an
/// extraction updates the metrics in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoKeywordRow {
    pub video_id: i64,
    pub keyword_id: i64,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub frequency: Option<u64>,
    #[serde(default)]
    pub hit_rate: Option<u8>,
    #[serde(default)]
    pub hashtag_count: Option<u64>,
}

pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(Self {
            http,
            base_url: url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn request(&self, method: reqwest::Method, table: &str, query: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/rest/v1/{}{}", self.base_url, table, query);
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn expect_ok(response: reqwest::Response, context: &str) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Persistence(format!(
            "{context}: HTTP {} {}",
            status.as_u16(),
            body.chars().take(200).collect::<String>()
        )))
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        context: &str,
    ) -> Result<Vec<T>, Error> {
        let response = self
            .request(reqwest::Method::GET, table, query)
            .send()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        let response = Self::expect_ok(response, context).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))
    }

    pub async fn list_videos(&self) -> Result<Vec<VideoAssetRow>, Error> {
        self.fetch_rows("video_assets", "?select=*&order=created_at.desc", "list videos")
            .await
    }

    pub async fn list_channels(&self) -> Result<Vec<ChannelAssetRow>, Error> {
        self.fetch_rows(
            "channel_assets",
            "?select=*&order=created_at.desc",
            "list channels",
        )
        .await
    }

    /// Video ids already saved, for de-duplicating before insert.
    pub async fn saved_video_ids(&self) -> Result<Vec<String>, Error> {
        #[derive(Deserialize)]
        struct IdRow {
            video_id: String,
        }
        let rows: Vec<IdRow> = self
            .fetch_rows("video_assets", "?select=video_id", "list saved video ids")
            .await?;
        Ok(rows.into_iter().map(|r| r.video_id).collect())
    }

    pub async fn saved_channel_ids(&self) -> Result<Vec<String>, Error> {
        #[derive(Deserialize)]
        struct IdRow {
            channel_id: String,
        }
        let rows: Vec<IdRow> = self
            .fetch_rows("channel_assets", "?select=channel_id", "list saved channel ids")
            .await?;
        Ok(rows.into_iter().map(|r| r.channel_id).collect())
    }

    /// Inserts a video and returns the stored row with its database id.
    pub async fn insert_video(&self, video: &VideoRecord) -> Result<VideoAssetRow, Error> {
        let row = VideoAssetRow::from_record(video);
        let response = self
            .request(reqwest::Method::POST, "video_assets", "")
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        let response = Self::expect_ok(response, "insert video").await?;
        let mut rows: Vec<VideoAssetRow> = response
            .json()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        rows.pop()
            .ok_or_else(|| Error::Persistence("insert video returned no row".to_string()))
    }

    pub async fn insert_channel(&self, channel: &ChannelRecord) -> Result<ChannelAssetRow, Error> {
        let row = ChannelAssetRow::from_record(channel);
        let response = self
            .request(reqwest::Method::POST, "channel_assets", "")
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        let response = Self::expect_ok(response, "insert channel").await?;
        let mut rows: Vec<ChannelAssetRow> = response
            .json()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        rows.pop()
            .ok_or_else(|| Error::Persistence("insert channel returned no row".to_string()))
    }

    pub async fn update_video_category(&self, db_id: i64, category: &str) -> Result<(), Error> {
        let response = self
            .request(
                reqwest::Method::PATCH,
                "video_assets",
                &format!("?id=eq.{db_id}"),
            )
            .json(&serde_json::json!({ "category": category }))
            .send()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Self::expect_ok(response, "update video category").await?;
        Ok(())
    }

    pub async fn delete_video(&self, db_id: i64) -> Result<(), Error> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                "video_assets",
                &format!("?id=eq.{db_id}"),
            )
            .send()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Self::expect_ok(response, "delete video").await?;
        Ok(())
    }

    pub async fn delete_channel(&self, db_id: i64) -> Result<(), Error> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                "channel_assets",
                &format!("?id=eq.{db_id}"),
            )
            .send()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Self::expect_ok(response, "delete channel").await?;
        Ok(())
    }

    async fn find_keyword(&self, keyword: &str) -> Result<Option<KeywordRow>, Error> {
        let query = format!(
            "?keyword=eq.{}&select=*",
            urlencode(keyword)
        );
        let rows: Vec<KeywordRow> = self
            .fetch_rows("keywords", &query, "find keyword")
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_keyword(&self, candidate: &KeywordCandidate) -> Result<KeywordRow, Error> {
        let row = KeywordRow {
            id: None,
            keyword: candidate.keyword.clone(),
            keyword_type: candidate.kind.as_str().to_string(),
            trend: candidate.trend.clone(),
        };
        let response = self
            .request(reqwest::Method::POST, "keywords", "")
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        let response = Self::expect_ok(response, "insert keyword").await?;
        let mut rows: Vec<KeywordRow> = response
            .json()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        rows.pop()
            .ok_or_else(|| Error::Persistence("insert keyword returned no row".to_string()))
    }

    async fn upsert_video_keyword(&self, row: &VideoKeywordRow) -> Result<(), Error> {
        let response = self
            .request(
                reqwest::Method::POST,
                "video_keywords",
                "?on_conflict=video_id,keyword_id",
            )
            .header("Prefer", "resolution=merge-duplicates")
            .json(row)
            .send()
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Self::expect_ok(response, "upsert video keyword").await?;
        Ok(())
    }

    /// Persists extraction results for a saved video: reuses existing
    /// keyword rows, inserts new ones, and upserts the join rows so a rerun
    /// refreshes the metrics instead of duplicating them.
    pub async fn save_keywords(
        &self,
        video_db_id: i64,
        candidates: &[KeywordCandidate],
    ) -> Result<usize, Error> {
        let mut saved = 0;
        for candidate in candidates {
            let keyword_row = match self.find_keyword(&candidate.keyword).await? {
                Some(existing) => existing,
                None => self.insert_keyword(candidate).await?,
            };
            let keyword_id = keyword_row
                .id
                .ok_or_else(|| Error::Persistence("keyword row has no id".to_string()))?;
            self.upsert_video_keyword(&VideoKeywordRow {
                video_id: video_db_id,
                keyword_id,
                source: candidate
                    .primary_source()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                frequency: candidate.frequency,
                hit_rate: candidate.hit_rate,
                hashtag_count: candidate.hashtag_count,
            })
            .await?;
            saved += 1;
        }
        Ok(saved)
    }
}

/// Percent-encodes a PostgREST filter value. Only the characters that
/// break query parsing need escaping.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '&' => out.push_str("%26"),
            '#' => out.push_str("%23"),
            '%' => out.push_str("%25"),
            '+' => out.push_str("%2B"),
            ',' => out.push_str("%2C"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::keyword::{KeywordKind, KeywordSource};

    #[test]
    fn urlencode_escapes_filter_breakers() {
        assert_eq!(urlencode("budget headphones"), "budget%20headphones");
        assert_eq!(urlencode("a&b"), "a%26b");
        assert_eq!(urlencode("tag (rising)"), "tag%20%28rising%29");
        assert_eq!(urlencode("plain"), "plain");
    }

    #[test]
    fn video_row_serializes_without_id_or_created_at() {
        let row = VideoAssetRow {
            id: None,
            video_id: "vid00000001".to_string(),
            title: "t".to_string(),
            description: String::new(),
            thumbnail: None,
            channel_title: "c".to_string(),
            channel_id: "UCaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            subscriber_count: 1,
            view_count: 2,
            like_count: 3,
            comment_count: 4,
            duration: "PT1M".to_string(),
            published_at: None,
            tags: vec![],
            category: None,
            created_at: Some("2026-08-01T00:00:00Z".to_string()),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("created_at"));
        assert!(json.contains("\"video_id\":\"vid00000001\""));
    }

    #[test]
    fn keyword_row_carries_kind_and_trend() {
        let mut candidate = KeywordCandidate::new("budget headphones", KeywordSource::Ai);
        candidate.kind = KeywordKind::Hot;
        candidate.trend = Some("rising".to_string());
        let row = KeywordRow {
            id: None,
            keyword: candidate.keyword.clone(),
            keyword_type: candidate.kind.as_str().to_string(),
            trend: candidate.trend.clone(),
        };
        assert_eq!(row.keyword_type, "hot");
        assert_eq!(row.trend.as_deref(), Some("rising"));
    }

    #[test]
    fn deserializes_rows_with_db_fields() {
        let json = r#"[{
            "id": 7,
            "video_id": "vid00000001",
            "title": "saved",
            "created_at": "2026-08-01T00:00:00Z"
        }]"#;
        let rows: Vec<VideoAssetRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].id, Some(7));
        assert_eq!(rows[0].created_at.as_deref(), Some("2026-08-01T00:00:00Z"));
    }
}
