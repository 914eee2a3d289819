pub mod lexical;
pub mod remote;
pub mod wordlists;

use std::future::Future;

use crate::core::error::Error;
use crate::core::models::keyword::{KeywordCandidate, KeywordKind, VideoType};
use crate::core::provider::trends::SuggestionApi;
use crate::core::quota::EnrichmentCounterStore;

pub use lexical::{ExtractionInput, LexicalStrategy};
pub use remote::RemoteStrategy;

/// Trend classifications performed per extraction run. The upstream service
/// is metered, so only the top candidates are classified.
pub const MAX_TREND_CALLS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Lexical,
    Remote,
}

impl StrategyKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lexical" | "local" => Some(Self::Lexical),
            "remote" | "ai" => Some(Self::Remote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub candidates: Vec<KeywordCandidate>,
    pub video_type: VideoType,
    /// Set when validation was skipped or cut short by quota exhaustion.
    pub quota_warning: bool,
}

/// Extraction port shared by the offline and remote-assisted strategies.
pub trait KeywordStrategy: Send + Sync {
    fn extract(
        &self,
        input: ExtractionInput,
    ) -> impl Future<Output = Result<ExtractionOutcome, Error>> + Send;
}

impl KeywordStrategy for LexicalStrategy {
    fn extract(
        &self,
        input: ExtractionInput,
    ) -> impl Future<Output = Result<ExtractionOutcome, Error>> + Send {
        let candidates = LexicalStrategy::rank(self, &input);
        async move {
            Ok(ExtractionOutcome {
                candidates,
                video_type: VideoType::Unknown,
                quota_warning: false,
            })
        }
    }
}

/// Classifies the top candidates through the trend service, sequentially so
/// a service outage stops after one failed call. Each completed call bumps
/// the persisted counter; returns the number of calls made.
pub async fn classify_trends<S: SuggestionApi>(
    suggestions: &S,
    candidates: &mut [KeywordCandidate],
    counter: &EnrichmentCounterStore,
) -> Result<u64, Error> {
    let mut calls = 0u64;
    for candidate in candidates.iter_mut().take(MAX_TREND_CALLS) {
        let classification = match suggestions
            .classify_trend(candidate.search_keyword.clone())
            .await
        {
            Ok(c) => c,
            Err(_) => break,
        };
        calls += 1;
        if let Some(keyword_type) = classification.keyword_type.as_deref() {
            let kind = KeywordKind::from_wire(keyword_type);
            if kind != KeywordKind::Unknown {
                candidate.kind = kind;
            }
        }
        candidate.trend = classification.trend_type;
    }
    if calls > 0 {
        counter.increment(calls)?;
    }
    Ok(calls)
}
