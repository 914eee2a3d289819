use std::future::Future;
use std::time::Duration;

use crate::core::error::{ProviderError, ProviderErrorKind};
use crate::core::provider::schema::{
    ApiErrorBody, ChannelListResponse, SearchResponse, VideoListResponse,
};

/// Cost of one search call, in quota points.
pub const SEARCH_COST: u64 = 100;
/// Cost of one list call (videos or channels), regardless of id count.
pub const LIST_COST: u64 = 1;
/// Provider-enforced ceiling on ids per list call.
pub const MAX_IDS_PER_CALL: usize = 50;

/// Parameters for a search call. Unset fields are omitted from the request.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub channel_id: Option<String>,
    /// "video" or "channel".
    pub item_type: Option<String>,
    pub max_results: u32,
    /// "date", "viewCount" or provider default relevance when unset.
    pub order: Option<String>,
    /// RFC 3339 lower bound on publish time.
    pub published_after: Option<String>,
    /// Restrict to videos under 4 minutes.
    pub short_duration: bool,
    pub page_token: Option<String>,
}

impl SearchParams {
    pub fn query(text: impl Into<String>) -> Self {
        Self {
            query: Some(text.into()),
            max_results: 50,
            ..Self::default()
        }
    }

    pub fn channel_uploads(channel_id: impl Into<String>, max_results: u32) -> Self {
        Self {
            channel_id: Some(channel_id.into()),
            item_type: Some("video".to_string()),
            order: Some("date".to_string()),
            max_results,
            ..Self::default()
        }
    }
}

/// Metadata-provider port. Key selection stays with the caller; each call
/// receives the key to spend so the ledger and the wire agree on who paid.
pub trait VideoApi: Send + Sync {
    fn search(
        &self,
        key: String,
        params: SearchParams,
    ) -> impl Future<Output = Result<SearchResponse, ProviderError>> + Send;

    fn video_details(
        &self,
        key: String,
        ids: Vec<String>,
    ) -> impl Future<Output = Result<VideoListResponse, ProviderError>> + Send;

    fn channel_details(
        &self,
        key: String,
        ids: Vec<String>,
    ) -> impl Future<Output = Result<ChannelListResponse, ProviderError>> + Send;

    fn most_popular(
        &self,
        key: String,
        region_code: String,
        max_results: u32,
    ) -> impl Future<Output = Result<VideoListResponse, ProviderError>> + Send;
}

pub struct YoutubeClient {
    http: reqwest::Client,
    base_url: String,
}

impl YoutubeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ProviderError::decode(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&body) {
            let kind = if parsed.is_quota_error() {
                ProviderErrorKind::QuotaExceeded
            } else if status.as_u16() == 404 {
                ProviderErrorKind::NotFound
            } else {
                ProviderErrorKind::Http
            };
            return Err(ProviderError::new(
                kind,
                Some(status.as_u16()),
                parsed.error.message,
            ));
        }
        Err(ProviderError::new(
            ProviderErrorKind::Http,
            Some(status.as_u16()),
            format!("unexpected response: {}", body.chars().take(200).collect::<String>()),
        ))
    }
}

impl VideoApi for YoutubeClient {
    fn search(
        &self,
        key: String,
        params: SearchParams,
    ) -> impl Future<Output = Result<SearchResponse, ProviderError>> + Send {
        async move {
            let mut query: Vec<(&str, String)> = vec![
                ("part", "snippet".to_string()),
                ("maxResults", params.max_results.max(1).to_string()),
                ("key", key),
            ];
            if let Some(q) = params.query {
                query.push(("q", q));
            }
            if let Some(channel) = params.channel_id {
                query.push(("channelId", channel));
            }
            if let Some(t) = params.item_type {
                query.push(("type", t));
            }
            if let Some(order) = params.order {
                query.push(("order", order));
            }
            if let Some(after) = params.published_after {
                query.push(("publishedAfter", after));
            }
            if params.short_duration {
                query.push(("videoDuration", "short".to_string()));
            }
            if let Some(token) = params.page_token {
                query.push(("pageToken", token));
            }
            self.get_json("search", &query).await
        }
    }

    fn video_details(
        &self,
        key: String,
        ids: Vec<String>,
    ) -> impl Future<Output = Result<VideoListResponse, ProviderError>> + Send {
        async move {
            let query = vec![
                (
                    "part",
                    "snippet,statistics,contentDetails,liveStreamingDetails".to_string(),
                ),
                ("id", ids.join(",")),
                ("key", key),
            ];
            self.get_json("videos", &query).await
        }
    }

    fn channel_details(
        &self,
        key: String,
        ids: Vec<String>,
    ) -> impl Future<Output = Result<ChannelListResponse, ProviderError>> + Send {
        async move {
            let query = vec![
                ("part", "snippet,statistics".to_string()),
                ("id", ids.join(",")),
                ("key", key),
            ];
            self.get_json("channels", &query).await
        }
    }

    fn most_popular(
        &self,
        key: String,
        region_code: String,
        max_results: u32,
    ) -> impl Future<Output = Result<VideoListResponse, ProviderError>> + Send {
        async move {
            let query = vec![
                (
                    "part",
                    "snippet,statistics,contentDetails,liveStreamingDetails".to_string(),
                ),
                ("chart", "mostPopular".to_string()),
                ("regionCode", region_code),
                ("maxResults", max_results.max(1).to_string()),
                ("key", key),
            ];
            self.get_json("videos", &query).await
        }
    }
}

/// Splits ids into provider-sized list calls and returns the number of
/// calls needed, for cost previews.
pub fn list_call_count(id_count: usize) -> u64 {
    id_count.div_ceil(MAX_IDS_PER_CALL) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_call_count_chunks_by_fifty() {
        assert_eq!(list_call_count(0), 0);
        assert_eq!(list_call_count(1), 1);
        assert_eq!(list_call_count(50), 1);
        assert_eq!(list_call_count(51), 2);
        assert_eq!(list_call_count(100), 2);
    }

    #[test]
    fn search_params_defaults() {
        let params = SearchParams::query("lofi beats");
        assert_eq!(params.max_results, 50);
        assert!(params.order.is_none());
        assert!(!params.short_duration);
    }

    #[test]
    fn channel_uploads_params() {
        let params = SearchParams::channel_uploads("UCuAXFkgsw1L7xaCfnd5JJOw", 10);
        assert_eq!(params.order.as_deref(), Some("date"));
        assert_eq!(params.item_type.as_deref(), Some("video"));
        assert_eq!(params.max_results, 10);
    }
}
