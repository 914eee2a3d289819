pub mod schema;
pub mod transcript;
pub mod trends;
pub mod youtube;

pub use transcript::{TranscriptFetcher, TranscriptInfo};
pub use trends::{KeywordServiceClient, KeywordSuggestion, SuggestionApi, SuggestionRequest, TrendClassification};
pub use youtube::{SearchParams, VideoApi, YoutubeClient, LIST_COST, MAX_IDS_PER_CALL, SEARCH_COST};
