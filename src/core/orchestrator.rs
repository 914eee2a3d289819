use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::core::error::{Error, ProviderError};
use crate::core::filter::{ContentType, ResultFilters};
use crate::core::ids::{extract_channel_id, extract_video_id};
use crate::core::models::video::{format_duration, ChannelRecord, LiveBroadcast, VideoRecord};
use crate::core::provider::schema::{parse_count, ChannelItem, VideoItem};
use crate::core::provider::youtube::{
    list_call_count, SearchParams, VideoApi, LIST_COST, MAX_IDS_PER_CALL, SEARCH_COST,
};
use crate::core::quota::{OperationGuard, PreflightOutcome, QuotaTracker, RotationPolicy};

/// Pause between per-channel fetches during analysis.
const ANALYSIS_DELAY_MS: u64 = 100;
/// Videos fetched per channel during analysis.
const ANALYSIS_VIDEOS_PER_CHANNEL: u32 = 10;

/// Quota accounting attached to every completed operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpReport {
    /// Points spent by this operation.
    pub cost: u64,
    /// Key index the ledger rotated to during the operation, if any.
    pub rotated_to: Option<usize>,
    /// The whole pool is at threshold; subsequent operations will refuse.
    pub exhausted: bool,
}

#[derive(Debug, Clone)]
pub struct SearchPage {
    pub videos: Vec<VideoRecord>,
    pub next_page_token: Option<String>,
    pub report: OpReport,
}

#[derive(Debug, Clone)]
pub struct ChannelAnalysis {
    pub channel: ChannelRecord,
    /// Recent uploads, filtered and sorted newest first.
    pub videos: Vec<VideoRecord>,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub channels: Vec<ChannelAnalysis>,
    /// Inputs that could not be analyzed, with the reason.
    pub skipped: Vec<(String, String)>,
    pub report: OpReport,
}

#[derive(Debug, Clone)]
pub struct AddedVideo {
    pub video: VideoRecord,
    pub report: OpReport,
}

#[derive(Debug, Clone)]
pub struct AddedChannel {
    pub channel: ChannelRecord,
    pub report: OpReport,
}

/// Coordinates metadata calls with the quota ledger: preflight before the
/// first call, one summed charge when the operation finishes, rotation and
/// retry when the provider rejects a key mid-flight.
pub struct Orchestrator<V: VideoApi> {
    api: Arc<V>,
    tracker: Arc<QuotaTracker>,
    policy: RotationPolicy,
    keys: Vec<String>,
    region_code: String,
}

impl<V: VideoApi> Orchestrator<V> {
    pub fn new(
        api: Arc<V>,
        tracker: Arc<QuotaTracker>,
        policy: RotationPolicy,
        keys: Vec<String>,
        region_code: String,
    ) -> Self {
        Self {
            api,
            tracker,
            policy,
            keys,
            region_code,
        }
    }

    pub fn tracker(&self) -> &Arc<QuotaTracker> {
        &self.tracker
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    pub fn api(&self) -> &Arc<V> {
        &self.api
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Estimated cost of analyzing `channel_count` channels: one resolve
    /// list and one uploads search per channel, plus chunked detail lists.
    pub fn analysis_cost_estimate(channel_count: usize) -> u64 {
        let searches = channel_count as u64 * SEARCH_COST;
        let resolves = channel_count as u64;
        let lists = list_call_count(channel_count * ANALYSIS_VIDEOS_PER_CHANNEL as usize);
        searches + (resolves + lists) * LIST_COST
    }

    /// Estimated cost of adding one channel by the given input form.
    pub fn add_channel_cost(input: &str) -> u64 {
        match extract_channel_id(input) {
            Some(id) if id.starts_with('@') => SEARCH_COST + LIST_COST,
            _ => LIST_COST,
        }
    }

    fn current_key(&self) -> Result<String, Error> {
        if self.keys.is_empty() {
            return Err(Error::InvalidInput("no API keys configured".to_string()));
        }
        let index = self.tracker.current_index().min(self.keys.len() - 1);
        Ok(self.keys[index].clone())
    }

    /// Refuses the operation outright when every key is already hot.
    fn preflight(&self, report: &mut OpReport) -> Result<(), Error> {
        match self.tracker.preflight(&self.policy)? {
            PreflightOutcome::Ready => Ok(()),
            PreflightOutcome::Rotated(index) => {
                report.rotated_to = Some(index);
                Ok(())
            }
            PreflightOutcome::Exhausted => Err(Error::QuotaExhausted),
        }
    }

    /// Runs one provider call, rotating keys on quota rejections until the
    /// rotation wraps. Cost is counted only for calls that completed.
    async fn with_rotation<T, F, Fut>(
        &self,
        guard: &mut OperationGuard,
        cost: &mut u64,
        call_cost: u64,
        call: F,
    ) -> Result<T, Error>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        loop {
            let key = self.current_key()?;
            match call(key).await {
                Ok(value) => {
                    *cost += call_cost;
                    return Ok(value);
                }
                Err(e) if e.is_quota_exceeded() => {
                    guard.on_quota_error(&self.tracker)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn settle(&self, cost: u64, report: &mut OpReport) -> Result<(), Error> {
        report.cost = cost;
        if cost == 0 {
            return Ok(());
        }
        let outcome = self.tracker.charge(cost, &self.policy)?;
        if report.rotated_to.is_none() {
            report.rotated_to = outcome.rotated_to;
        }
        report.exhausted = outcome.exhausted;
        Ok(())
    }

    /// Keyword search. An empty query falls back to the region's trending
    /// chart, which costs a single list call instead of a search.
    ///
    /// Returned videos are unfiltered; `filters` only shapes the request
    /// (ordering, publish-time bound). Callers apply `ResultFilters::apply`
    /// so pagination tokens stay aligned with the provider's result set.
    pub async fn search(
        &self,
        query: &str,
        filters: &ResultFilters,
        page_token: Option<String>,
    ) -> Result<SearchPage, Error> {
        let mut report = OpReport::default();
        self.preflight(&mut report)?;
        let mut cost = 0u64;
        let result = if query.trim().is_empty() {
            self.trending_inner(&mut cost).await
        } else {
            self.search_inner(query, filters, page_token, &mut cost).await
        };
        self.settle(cost, &mut report)?;
        let (videos, next_page_token) = result?;
        Ok(SearchPage {
            videos,
            next_page_token,
            report,
        })
    }

    async fn search_inner(
        &self,
        query: &str,
        filters: &ResultFilters,
        page_token: Option<String>,
        cost: &mut u64,
    ) -> Result<(Vec<VideoRecord>, Option<String>), Error> {
        let mut guard = OperationGuard::begin(&self.tracker);
        let mut params = SearchParams::query(query);
        params.item_type = Some("video".to_string());
        params.page_token = page_token;
        if filters.views.prefers_view_order() {
            params.order = Some("viewCount".to_string());
        }
        if filters.content_type == ContentType::Shorts {
            params.short_duration = true;
        }
        if let Some(after) = filters.date.published_after(Utc::now()) {
            params.published_after = Some(after.to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
        }

        let page = self
            .with_rotation(&mut guard, cost, SEARCH_COST, |key| {
                self.api.search(key, params.clone())
            })
            .await?;
        let next_page_token = page.next_page_token.clone();

        let video_ids: Vec<String> = page
            .items
            .iter()
            .filter_map(|item| item.id.video_id.clone())
            .collect();
        let videos = self.hydrate_videos(&mut guard, cost, video_ids).await?;
        Ok((videos, next_page_token))
    }

    async fn trending_inner(
        &self,
        cost: &mut u64,
    ) -> Result<(Vec<VideoRecord>, Option<String>), Error> {
        let mut guard = OperationGuard::begin(&self.tracker);
        let region = self.region_code.clone();
        let listing = self
            .with_rotation(&mut guard, cost, LIST_COST, |key| {
                self.api.most_popular(key, region.clone(), 50)
            })
            .await?;
        let channels = self
            .fetch_channels_for(&mut guard, cost, &listing.items)
            .await?;
        Ok((build_video_records(listing.items, &channels), None))
    }

    /// Fetches full details plus owning-channel stats for the given video
    /// ids and assembles records, chunking list calls at the provider limit.
    async fn hydrate_videos(
        &self,
        guard: &mut OperationGuard,
        cost: &mut u64,
        video_ids: Vec<String>,
    ) -> Result<Vec<VideoRecord>, Error> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut items: Vec<VideoItem> = Vec::new();
        for chunk in video_ids.chunks(MAX_IDS_PER_CALL) {
            let ids = chunk.to_vec();
            let listing = self
                .with_rotation(guard, cost, LIST_COST, |key| {
                    self.api.video_details(key, ids.clone())
                })
                .await?;
            items.extend(listing.items);
        }
        let channels = self.fetch_channels_for(guard, cost, &items).await?;
        Ok(build_video_records(items, &channels))
    }

    async fn fetch_channels_for(
        &self,
        guard: &mut OperationGuard,
        cost: &mut u64,
        items: &[VideoItem],
    ) -> Result<HashMap<String, ChannelItem>, Error> {
        let mut channel_ids: Vec<String> = items
            .iter()
            .filter_map(|v| v.snippet.as_ref().and_then(|s| s.channel_id.clone()))
            .collect();
        channel_ids.sort();
        channel_ids.dedup();

        let mut map = HashMap::new();
        for chunk in channel_ids.chunks(MAX_IDS_PER_CALL) {
            let ids = chunk.to_vec();
            let listing = self
                .with_rotation(guard, cost, LIST_COST, |key| {
                    self.api.channel_details(key, ids.clone())
                })
                .await?;
            for channel in listing.items {
                map.insert(channel.id.clone(), channel);
            }
        }
        Ok(map)
    }

    /// Fetches recent uploads for each channel, applying `filters` to each
    /// channel's videos and sorting them newest first. Channels that
    /// fail for non-quota reasons are skipped and reported; a quota
    /// rejection aborts the whole run.
    pub async fn analyze_channels(
        &self,
        inputs: &[String],
        filters: &ResultFilters,
    ) -> Result<AnalysisOutcome, Error> {
        let mut report = OpReport::default();
        self.preflight(&mut report)?;
        let mut cost = 0u64;
        let mut channels = Vec::new();
        let mut skipped = Vec::new();

        let result = self
            .analyze_inner(inputs, filters, &mut cost, &mut channels, &mut skipped)
            .await;
        self.settle(cost, &mut report)?;
        result?;
        Ok(AnalysisOutcome {
            channels,
            skipped,
            report,
        })
    }

    async fn analyze_inner(
        &self,
        inputs: &[String],
        filters: &ResultFilters,
        cost: &mut u64,
        channels: &mut Vec<ChannelAnalysis>,
        skipped: &mut Vec<(String, String)>,
    ) -> Result<(), Error> {
        let mut guard = OperationGuard::begin(&self.tracker);
        let now = Utc::now();
        for (i, input) in inputs.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(ANALYSIS_DELAY_MS)).await;
            }
            match self
                .analyze_one(&mut guard, cost, input, filters, now)
                .await
            {
                Ok(analysis) => channels.push(analysis),
                Err(Error::QuotaExhausted) => return Err(Error::QuotaExhausted),
                Err(e) => skipped.push((input.clone(), e.to_string())),
            }
        }
        Ok(())
    }

    async fn analyze_one(
        &self,
        guard: &mut OperationGuard,
        cost: &mut u64,
        input: &str,
        filters: &ResultFilters,
        now: DateTime<Utc>,
    ) -> Result<ChannelAnalysis, Error> {
        let channel_item = self.resolve_channel(guard, cost, input).await?;
        let channel = build_channel_record(&channel_item);

        let mut params =
            SearchParams::channel_uploads(channel.channel_id.clone(), ANALYSIS_VIDEOS_PER_CHANNEL);
        if let Some(after) = filters.date.published_after(now) {
            params.published_after = Some(after.to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
        }
        let page = self
            .with_rotation(guard, cost, SEARCH_COST, |key| {
                self.api.search(key, params.clone())
            })
            .await?;
        let video_ids: Vec<String> = page
            .items
            .iter()
            .filter_map(|item| item.id.video_id.clone())
            .collect();

        let mut items: Vec<VideoItem> = Vec::new();
        for chunk in video_ids.chunks(MAX_IDS_PER_CALL) {
            let ids = chunk.to_vec();
            let listing = self
                .with_rotation(guard, cost, LIST_COST, |key| {
                    self.api.video_details(key, ids.clone())
                })
                .await?;
            items.extend(listing.items);
        }

        let mut by_id = HashMap::new();
        by_id.insert(channel_item.id.clone(), channel_item);
        let mut videos = filters.apply(build_video_records(items, &by_id), now);
        videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(ChannelAnalysis { channel, videos })
    }

    /// Fetches one video by id or URL and assembles the full record.
    pub async fn add_video(&self, input: &str) -> Result<AddedVideo, Error> {
        let id = extract_video_id(input)
            .ok_or_else(|| Error::InvalidInput(format!("not a video id or URL: {input}")))?;
        let mut report = OpReport::default();
        self.preflight(&mut report)?;
        let mut cost = 0u64;
        let result = self.add_video_inner(&id, &mut cost).await;
        self.settle(cost, &mut report)?;
        let video = result?;
        Ok(AddedVideo { video, report })
    }

    async fn add_video_inner(&self, id: &str, cost: &mut u64) -> Result<VideoRecord, Error> {
        let mut guard = OperationGuard::begin(&self.tracker);
        let mut videos = self
            .hydrate_videos(&mut guard, cost, vec![id.to_string()])
            .await?;
        if videos.is_empty() {
            return Err(Error::NotFound(format!("video {id} not found")));
        }
        Ok(videos.remove(0))
    }

    /// Resolves a channel by id, URL or @handle and returns its record.
    /// Handle resolution costs a search call; direct ids cost one list call.
    pub async fn add_channel(&self, input: &str) -> Result<AddedChannel, Error> {
        let id = extract_channel_id(input)
            .ok_or_else(|| Error::InvalidInput(format!("not a channel id, URL or handle: {input}")))?;
        let mut report = OpReport::default();
        self.preflight(&mut report)?;
        let mut cost = 0u64;
        let mut guard = OperationGuard::begin(&self.tracker);
        let result = self.resolve_channel(&mut guard, &mut cost, &id).await;
        self.settle(cost, &mut report)?;
        let item = result?;
        Ok(AddedChannel {
            channel: build_channel_record(&item),
            report,
        })
    }

    async fn resolve_channel(
        &self,
        guard: &mut OperationGuard,
        cost: &mut u64,
        input: &str,
    ) -> Result<ChannelItem, Error> {
        let id = extract_channel_id(input)
            .ok_or_else(|| Error::InvalidInput(format!("not a channel id, URL or handle: {input}")))?;

        if let Some(handle) = id.strip_prefix('@') {
            return self.resolve_handle(guard, cost, handle).await;
        }

        let ids = vec![id.clone()];
        let listing = self
            .with_rotation(guard, cost, LIST_COST, |key| {
                self.api.channel_details(key, ids.clone())
            })
            .await?;
        listing
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("channel {id} not found")))
    }

    /// Handle resolution goes through search, then matches the candidates'
    /// custom URLs against the handle to avoid picking an impersonator.
    async fn resolve_handle(
        &self,
        guard: &mut OperationGuard,
        cost: &mut u64,
        handle: &str,
    ) -> Result<ChannelItem, Error> {
        let mut params = SearchParams::query(handle);
        params.item_type = Some("channel".to_string());
        params.max_results = 5;
        let page = self
            .with_rotation(guard, cost, SEARCH_COST, |key| {
                self.api.search(key, params.clone())
            })
            .await?;
        let candidate_ids: Vec<String> = page
            .items
            .iter()
            .filter_map(|item| item.id.channel_id.clone())
            .collect();
        if candidate_ids.is_empty() {
            return Err(Error::NotFound(format!("channel @{handle} not found")));
        }

        let ids = candidate_ids.clone();
        let listing = self
            .with_rotation(guard, cost, LIST_COST, |key| {
                self.api.channel_details(key, ids.clone())
            })
            .await?;

        let wanted = format!("@{}", handle.to_lowercase());
        let mut items = listing.items;
        if let Some(pos) = items.iter().position(|c| {
            c.snippet
                .as_ref()
                .and_then(|s| s.custom_url.as_deref())
                .map(|u| u.to_lowercase() == wanted)
                .unwrap_or(false)
        }) {
            return Ok(items.remove(pos));
        }
        items
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("channel @{handle} not found")))
    }
}

fn parse_published(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn build_channel_record(item: &ChannelItem) -> ChannelRecord {
    let snippet = item.snippet.clone().unwrap_or_default();
    ChannelRecord {
        channel_id: item.id.clone(),
        channel_title: snippet.title,
        thumbnail: snippet.thumbnails.as_ref().and_then(|t| t.best_url()),
        subscriber_count: item
            .statistics
            .as_ref()
            .map(|s| parse_count(&s.subscriber_count))
            .unwrap_or(0),
        category: None,
        db_id: None,
    }
}

pub(crate) fn build_video_records(
    items: Vec<VideoItem>,
    channels: &HashMap<String, ChannelItem>,
) -> Vec<VideoRecord> {
    items
        .into_iter()
        .map(|item| {
            let snippet = item.snippet.unwrap_or_default();
            let channel_id = snippet.channel_id.clone().unwrap_or_default();
            let channel = channels.get(&channel_id);
            let stats = item.statistics.unwrap_or_default();
            let duration = item
                .content_details
                .and_then(|d| d.duration)
                .unwrap_or_else(|| "PT0S".to_string());
            let is_live_content = item
                .live_streaming_details
                .as_ref()
                .map(|d| d.actual_start_time.is_some() || d.scheduled_start_time.is_some())
                .unwrap_or(false);
            VideoRecord {
                id: item.id,
                title: snippet.title,
                description: snippet.description,
                thumbnail: snippet.thumbnails.as_ref().and_then(|t| t.best_url()),
                published_at: parse_published(snippet.published_at.as_deref()),
                channel_title: snippet.channel_title.unwrap_or_default(),
                channel_thumbnail: channel
                    .and_then(|c| c.snippet.as_ref())
                    .and_then(|s| s.thumbnails.as_ref())
                    .and_then(|t| t.best_url()),
                channel_id,
                subscriber_count: channel
                    .and_then(|c| c.statistics.as_ref())
                    .map(|s| parse_count(&s.subscriber_count))
                    .unwrap_or(0),
                view_count: parse_count(&stats.view_count),
                like_count: parse_count(&stats.like_count),
                comment_count: parse_count(&stats.comment_count),
                formatted_duration: format_duration(&duration),
                duration,
                tags: snippet.tags,
                category: snippet.category_id,
                live_broadcast: LiveBroadcast::from_wire(snippet.live_broadcast_content.as_deref()),
                is_live_content,
                db_id: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::schema::{
        ChannelListResponse, SearchResponse, VideoListResponse,
    };
    use crate::core::quota::ledger::test_support::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted provider: answers from canned JSON, optionally rejecting
    /// the first N calls with a quota error. Records the keys used.
    struct ScriptedApi {
        search_json: String,
        videos_json: String,
        channels_json: String,
        quota_rejections: AtomicUsize,
        keys_seen: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn new(search_json: &str, videos_json: &str, channels_json: &str) -> Self {
            Self {
                search_json: search_json.to_string(),
                videos_json: videos_json.to_string(),
                channels_json: channels_json.to_string(),
                quota_rejections: AtomicUsize::new(0),
                keys_seen: Mutex::new(Vec::new()),
            }
        }

        fn rejecting_first(mut self, n: usize) -> Self {
            self.quota_rejections = AtomicUsize::new(n);
            self
        }

        fn gate(&self, key: &str) -> Result<(), ProviderError> {
            self.keys_seen.lock().unwrap().push(key.to_string());
            let remaining = self.quota_rejections.load(Ordering::SeqCst);
            if remaining > 0 {
                self.quota_rejections.store(remaining - 1, Ordering::SeqCst);
                return Err(ProviderError::new(
                    crate::core::error::ProviderErrorKind::QuotaExceeded,
                    Some(403),
                    "quota exceeded".to_string(),
                ));
            }
            Ok(())
        }
    }

    impl VideoApi for ScriptedApi {
        fn search(
            &self,
            key: String,
            _params: SearchParams,
        ) -> impl Future<Output = Result<SearchResponse, ProviderError>> + Send {
            async move {
                self.gate(&key)?;
                Ok(serde_json::from_str(&self.search_json).unwrap())
            }
        }

        fn video_details(
            &self,
            key: String,
            _ids: Vec<String>,
        ) -> impl Future<Output = Result<VideoListResponse, ProviderError>> + Send {
            async move {
                self.gate(&key)?;
                Ok(serde_json::from_str(&self.videos_json).unwrap())
            }
        }

        fn channel_details(
            &self,
            key: String,
            _ids: Vec<String>,
        ) -> impl Future<Output = Result<ChannelListResponse, ProviderError>> + Send {
            async move {
                self.gate(&key)?;
                Ok(serde_json::from_str(&self.channels_json).unwrap())
            }
        }

        fn most_popular(
            &self,
            key: String,
            _region_code: String,
            _max_results: u32,
        ) -> impl Future<Output = Result<VideoListResponse, ProviderError>> + Send {
            async move {
                self.gate(&key)?;
                Ok(serde_json::from_str(&self.videos_json).unwrap())
            }
        }
    }

    const SEARCH_JSON: &str = r#"{
        "items": [{"id": {"videoId": "vid00000001"}, "snippet": {"title": "hit", "channelId": "UCaaaaaaaaaaaaaaaaaaaaaa"}}],
        "nextPageToken": "NEXT"
    }"#;
    const VIDEOS_JSON: &str = r#"{
        "items": [{
            "id": "vid00000001",
            "snippet": {
                "title": "hit",
                "description": "",
                "channelId": "UCaaaaaaaaaaaaaaaaaaaaaa",
                "channelTitle": "chan",
                "publishedAt": "2026-08-20T00:00:00Z",
                "liveBroadcastContent": "none"
            },
            "statistics": {"viewCount": "12345", "likeCount": "10"},
            "contentDetails": {"duration": "PT5M0S"}
        }]
    }"#;
    const CHANNELS_JSON: &str = r#"{
        "items": [{
            "id": "UCaaaaaaaaaaaaaaaaaaaaaa",
            "snippet": {"title": "chan", "description": ""},
            "statistics": {"subscriberCount": "42000"}
        }]
    }"#;

    const HANDLE_SEARCH_JSON: &str = r#"{
        "items": [
            {"id": {"channelId": "UCfakefakefakefakefakefa"}, "snippet": {"title": "Some Creator Fan"}},
            {"id": {"channelId": "UCrealrealrealrealrealre"}, "snippet": {"title": "Some Creator"}}
        ]
    }"#;
    const HANDLE_CHANNELS_JSON: &str = r#"{
        "items": [
            {
                "id": "UCfakefakefakefakefakefa",
                "snippet": {"title": "Some Creator Fan", "customUrl": "@somecreatorfan"},
                "statistics": {"subscriberCount": "120"}
            },
            {
                "id": "UCrealrealrealrealrealre",
                "snippet": {"title": "Some Creator", "customUrl": "@SomeCreator"},
                "statistics": {"subscriberCount": "250000"}
            }
        ]
    }"#;

    fn orchestrator(api: ScriptedApi, key_count: usize) -> Orchestrator<ScriptedApi> {
        let tracker =
            Arc::new(QuotaTracker::load(Box::new(MemoryStore::default()), key_count).unwrap());
        let keys = (0..key_count).map(|i| format!("key-{i}")).collect();
        Orchestrator::new(
            Arc::new(api),
            tracker,
            RotationPolicy::new(10_000, 0.8),
            keys,
            "US".to_string(),
        )
    }

    #[tokio::test]
    async fn search_charges_search_plus_lists() {
        let orch = orchestrator(ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON), 1);
        let page = orch
            .search("query", &ResultFilters::default(), None)
            .await
            .unwrap();
        // one search, one video list, one channel list
        assert_eq!(page.report.cost, 102);
        assert_eq!(orch.tracker().snapshot().used(0), 102);
        assert_eq!(page.next_page_token.as_deref(), Some("NEXT"));
        assert_eq!(page.videos.len(), 1);
        let video = &page.videos[0];
        assert_eq!(video.view_count, 12_345);
        assert_eq!(video.subscriber_count, 42_000);
        assert_eq!(video.formatted_duration, "05:00");
    }

    #[tokio::test]
    async fn empty_query_uses_trending_chart() {
        let orch = orchestrator(ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON), 1);
        let page = orch
            .search("  ", &ResultFilters::default(), None)
            .await
            .unwrap();
        // one mostPopular list, one channel list
        assert_eq!(page.report.cost, 2);
        assert!(page.next_page_token.is_none());
        assert_eq!(page.videos.len(), 1);
    }

    #[tokio::test]
    async fn quota_rejection_rotates_key_and_retries() {
        let api = ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON).rejecting_first(1);
        let orch = orchestrator(api, 2);
        let page = orch
            .search("query", &ResultFilters::default(), None)
            .await
            .unwrap();
        assert_eq!(page.videos.len(), 1);
        // the rejected call was not charged
        assert_eq!(page.report.cost, 102);
        let keys = orch.api().keys_seen.lock().unwrap().clone();
        assert_eq!(keys[0], "key-0");
        assert_eq!(keys[1], "key-1");
        assert_eq!(orch.tracker().current_index(), 1);
    }

    #[tokio::test]
    async fn single_key_quota_rejection_is_exhaustion() {
        let api = ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON).rejecting_first(1);
        let orch = orchestrator(api, 1);
        let err = orch
            .search("query", &ResultFilters::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QuotaExhausted));
    }

    #[tokio::test]
    async fn all_keys_rejected_wraps_to_exhaustion() {
        let api = ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON).rejecting_first(10);
        let orch = orchestrator(api, 3);
        let err = orch
            .search("query", &ResultFilters::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QuotaExhausted));
        // tried each key exactly once before giving up
        assert_eq!(orch.api().keys_seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn preflight_refuses_exhausted_pool() {
        let orch = orchestrator(ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON), 2);
        orch.tracker()
            .charge(8_500, &orch.policy())
            .unwrap();
        orch.tracker()
            .charge(8_500, &orch.policy())
            .unwrap();
        let err = orch
            .search("query", &ResultFilters::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QuotaExhausted));
        // refused before any provider call
        assert!(orch.api().keys_seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn analyze_reports_cost_and_sorts_videos() {
        let orch = orchestrator(ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON), 1);
        let outcome = orch
            .analyze_channels(
                &["UCaaaaaaaaaaaaaaaaaaaaaa".to_string()],
                &ResultFilters::default(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.channels.len(), 1);
        assert!(outcome.skipped.is_empty());
        // channel list + uploads search + video list
        assert_eq!(outcome.report.cost, 102);
        let analysis = &outcome.channels[0];
        assert_eq!(analysis.channel.subscriber_count, 42_000);
        assert_eq!(analysis.videos.len(), 1);
    }

    #[tokio::test]
    async fn analyze_skips_bad_inputs() {
        let orch = orchestrator(ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON), 1);
        let outcome = orch
            .analyze_channels(&["!".to_string()], &ResultFilters::default())
            .await
            .unwrap();
        assert!(outcome.channels.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.report.cost, 0);
    }

    #[tokio::test]
    async fn add_video_resolves_urls() {
        let orch = orchestrator(ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON), 1);
        let added = orch
            .add_video("https://www.youtube.com/watch?v=vid00000001")
            .await
            .unwrap();
        assert_eq!(added.video.id, "vid00000001");
        assert_eq!(added.report.cost, 2);
    }

    #[tokio::test]
    async fn add_video_rejects_garbage() {
        let orch = orchestrator(ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON), 1);
        let err = orch.add_video("???").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn add_channel_by_id_costs_one_list() {
        let orch = orchestrator(ScriptedApi::new(SEARCH_JSON, VIDEOS_JSON, CHANNELS_JSON), 1);
        let added = orch.add_channel("UCaaaaaaaaaaaaaaaaaaaaaa").await.unwrap();
        assert_eq!(added.channel.channel_id, "UCaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(added.report.cost, 1);
    }

    #[tokio::test]
    async fn add_channel_by_handle_matches_custom_url() {
        let orch = orchestrator(
            ScriptedApi::new(HANDLE_SEARCH_JSON, VIDEOS_JSON, HANDLE_CHANNELS_JSON),
            1,
        );
        let added = orch.add_channel("@somecreator").await.unwrap();
        // the impersonator sorts first in search; the customUrl match wins,
        // case-insensitively
        assert_eq!(added.channel.channel_id, "UCrealrealrealrealrealre");
        assert_eq!(added.channel.subscriber_count, 250_000);
        // one channel-type search plus one details list
        assert_eq!(added.report.cost, 101);
        assert_eq!(orch.tracker().snapshot().used(0), 101);
    }

    #[test]
    fn cost_estimates() {
        // matches what analyze_channels actually charges per channel
        assert_eq!(Orchestrator::<ScriptedApi>::analysis_cost_estimate(1), 102);
        assert_eq!(Orchestrator::<ScriptedApi>::analysis_cost_estimate(5), 506);
        assert_eq!(Orchestrator::<ScriptedApi>::analysis_cost_estimate(6), 608);
        assert_eq!(Orchestrator::<ScriptedApi>::add_channel_cost("@somehandle"), 101);
        assert_eq!(
            Orchestrator::<ScriptedApi>::add_channel_cost("UCaaaaaaaaaaaaaaaaaaaaaa"),
            1
        );
    }
}
