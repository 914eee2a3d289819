use std::future::Future;
use std::sync::Arc;

use crate::core::error::{Error, ProviderError};
use crate::core::keywords::lexical::ExtractionInput;
use crate::core::keywords::{ExtractionOutcome, KeywordStrategy};
use crate::core::models::keyword::{HitVideo, KeywordCandidate, KeywordKind, VideoType};
use crate::core::provider::schema::parse_count;
use crate::core::provider::trends::{SuggestionApi, SuggestionRequest};
use crate::core::provider::youtube::{SearchParams, VideoApi, LIST_COST, MAX_IDS_PER_CALL, SEARCH_COST};
use crate::core::quota::{OperationGuard, PreflightOutcome, QuotaTracker, RotationPolicy};

/// Search results sampled per keyword for hit-rate validation.
const VALIDATION_SAMPLE: u32 = 50;
/// Hit videos kept on the candidate for display.
const MAX_HIT_VIDEOS: usize = 10;

/// View count at which a result counts as a hit for its length class.
/// Shorts go viral cheaper than long-form, so the bar is higher for them.
pub fn view_threshold(duration_seconds: u64) -> u64 {
    if duration_seconds <= 60 {
        1_000_000
    } else {
        500_000
    }
}

/// Hot at half the sample, potential at a fifth, weak below that.
pub fn classify_hit_rate(hit_rate: u8) -> KeywordKind {
    if hit_rate >= 50 {
        KeywordKind::Hot
    } else if hit_rate >= 20 {
        KeywordKind::Potential
    } else {
        KeywordKind::Weak
    }
}

/// Remote-assisted extraction: asks the suggestion service for keywords,
/// then validates each one against live search results concurrently. Only
/// keyword-driven videos are validated; content-driven ones return the raw
/// suggestions.
pub struct RemoteStrategy<V: VideoApi + 'static, S: SuggestionApi + 'static> {
    api: Arc<V>,
    suggestions: Arc<S>,
    tracker: Arc<QuotaTracker>,
    policy: RotationPolicy,
    keys: Arc<Vec<String>>,
}

impl<V: VideoApi + 'static, S: SuggestionApi + 'static> RemoteStrategy<V, S> {
    pub fn new(
        api: Arc<V>,
        suggestions: Arc<S>,
        tracker: Arc<QuotaTracker>,
        policy: RotationPolicy,
        keys: Vec<String>,
    ) -> Self {
        Self {
            api,
            suggestions,
            tracker,
            policy,
            keys: Arc::new(keys),
        }
    }

    async fn extract_inner(&self, input: ExtractionInput) -> Result<ExtractionOutcome, Error> {
        let request = SuggestionRequest {
            title: input.title,
            description: input.description,
            tags: input.tags,
            transcript: input.transcript,
        };
        let suggestion = self.suggestions.suggest_keywords(request).await?;
        let video_type = VideoType::from_wire(suggestion.video_type.as_deref().unwrap_or(""));
        let candidates: Vec<KeywordCandidate> = suggestion
            .keywords
            .iter()
            .map(|raw| KeywordCandidate::from_suggestion(raw))
            .collect();

        if video_type != VideoType::Keyword {
            return Ok(ExtractionOutcome {
                candidates,
                video_type,
                quota_warning: false,
            });
        }

        // One preflight for the whole batch. An exhausted pool downgrades
        // to suggestion-only output instead of failing the run.
        match self.tracker.preflight(&self.policy)? {
            PreflightOutcome::Exhausted => {
                return Ok(ExtractionOutcome {
                    candidates,
                    video_type,
                    quota_warning: true,
                });
            }
            PreflightOutcome::Ready | PreflightOutcome::Rotated(_) => {}
        }

        let mut handles = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let api = Arc::clone(&self.api);
            let suggestions = Arc::clone(&self.suggestions);
            let tracker = Arc::clone(&self.tracker);
            let keys = Arc::clone(&self.keys);
            let policy = self.policy;
            handles.push((
                candidate.keyword.clone(),
                candidate.primary_source(),
                tokio::spawn(async move {
                    enrich_candidate(api, suggestions, tracker, policy, keys, candidate).await
                }),
            ));
        }

        let mut enriched = Vec::with_capacity(handles.len());
        let mut quota_warning = false;
        for (keyword, source, handle) in handles {
            match handle.await {
                Ok((candidate, warned)) => {
                    quota_warning |= warned;
                    enriched.push(candidate);
                }
                // A panicked task loses only its own enrichment.
                Err(_) => {
                    let source =
                        source.unwrap_or(crate::core::models::keyword::KeywordSource::Ai);
                    enriched.push(KeywordCandidate::new(keyword, source));
                }
            }
        }
        Ok(ExtractionOutcome {
            candidates: enriched,
            video_type,
            quota_warning,
        })
    }
}

impl<V: VideoApi + 'static, S: SuggestionApi + 'static> KeywordStrategy for RemoteStrategy<V, S> {
    fn extract(
        &self,
        input: ExtractionInput,
    ) -> impl Future<Output = Result<ExtractionOutcome, Error>> + Send {
        self.extract_inner(input)
    }
}

async fn call_with_rotation<T, F, Fut>(
    tracker: &QuotaTracker,
    policy: &RotationPolicy,
    keys: &[String],
    guard: &mut OperationGuard,
    call_cost: u64,
    call: F,
) -> Result<T, Error>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    loop {
        if keys.is_empty() {
            return Err(Error::InvalidInput("no API keys configured".to_string()));
        }
        let key = keys[tracker.current_index().min(keys.len() - 1)].clone();
        match call(key).await {
            Ok(value) => {
                tracker.charge(call_cost, policy)?;
                return Ok(value);
            }
            Err(e) if e.is_quota_exceeded() => {
                guard.on_quota_error(tracker)?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Validates one keyword against live search. Partial failures leave the
/// candidate with whatever was gathered before the failure; a quota
/// exhaustion is reported so the caller can warn once.
async fn enrich_candidate<V: VideoApi, S: SuggestionApi>(
    api: Arc<V>,
    suggestions: Arc<S>,
    tracker: Arc<QuotaTracker>,
    policy: RotationPolicy,
    keys: Arc<Vec<String>>,
    mut candidate: KeywordCandidate,
) -> (KeywordCandidate, bool) {
    // Related terms come from the suggestion service, not the metered
    // provider; an unconfigured endpoint just leaves the list empty.
    if let Ok(related) = suggestions
        .related_keywords(candidate.search_keyword.clone())
        .await
    {
        candidate.related_keywords = related;
    }

    let mut guard = OperationGuard::begin(&tracker);
    match validate(
        &*api,
        &tracker,
        &policy,
        &keys,
        &mut guard,
        &mut candidate,
    )
    .await
    {
        Ok(()) => (candidate, false),
        Err(Error::QuotaExhausted) => (candidate, true),
        Err(_) => (candidate, false),
    }
}

async fn validate<V: VideoApi>(
    api: &V,
    tracker: &QuotaTracker,
    policy: &RotationPolicy,
    keys: &[String],
    guard: &mut OperationGuard,
    candidate: &mut KeywordCandidate,
) -> Result<(), Error> {
    let mut params = SearchParams::query(candidate.search_keyword.clone());
    params.item_type = Some("video".to_string());
    params.max_results = VALIDATION_SAMPLE;
    let page = call_with_rotation(tracker, policy, keys, guard, SEARCH_COST, |key| {
        api.search(key, params.clone())
    })
    .await?;

    let video_ids: Vec<String> = page
        .items
        .iter()
        .filter_map(|item| item.id.video_id.clone())
        .collect();
    let total = video_ids.len() as u64;
    candidate.total_searched = Some(total);

    let mut hits: Vec<HitVideo> = Vec::new();
    for chunk in video_ids.chunks(MAX_IDS_PER_CALL) {
        let ids = chunk.to_vec();
        let listing = call_with_rotation(tracker, policy, keys, guard, LIST_COST, |key| {
            api.video_details(key, ids.clone())
        })
        .await?;
        for item in listing.items {
            let stats = item.statistics.unwrap_or_default();
            let views = parse_count(&stats.view_count);
            let snippet = item.snippet.unwrap_or_default();
            let seconds = item
                .content_details
                .and_then(|d| d.duration)
                .map(|d| crate::core::models::video::iso_duration_seconds(&d))
                .unwrap_or(0);
            if views >= view_threshold(seconds) {
                hits.push(HitVideo {
                    id: item.id,
                    title: snippet.title,
                    thumbnail: snippet.thumbnails.as_ref().and_then(|t| t.best_url()),
                    view_count: views,
                    channel_title: snippet.channel_title.unwrap_or_default(),
                });
            }
        }
    }

    hits.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    candidate.hit_videos = Some(hits.len() as u64);
    let hit_rate = if total > 0 {
        ((hits.len() as f64 / total as f64) * 100.0).round() as u8
    } else {
        0
    };
    candidate.hit_rate = Some(hit_rate);
    candidate.kind = classify_hit_rate(hit_rate);
    hits.truncate(MAX_HIT_VIDEOS);
    candidate.hit_video_list = hits;

    // Hashtag reach: total result count for the tagged form of the keyword.
    let mut tag_params = SearchParams::query(format!("#{}", candidate.search_keyword.replace(' ', "")));
    tag_params.item_type = Some("video".to_string());
    tag_params.max_results = 1;
    let tag_page = call_with_rotation(tracker, policy, keys, guard, SEARCH_COST, |key| {
        api.search(key, tag_params.clone())
    })
    .await?;
    candidate.hashtag_count = tag_page.page_info.and_then(|p| p.total_results);

    Ok(())
}
