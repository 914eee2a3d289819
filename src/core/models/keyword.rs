use serde::{Deserialize, Serialize};

/// Where a candidate was observed. One candidate can carry several tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordSource {
    Title,
    Tag,
    Hashtag,
    Script,
    Description,
    Ai,
}

impl KeywordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Tag => "tag",
            Self::Hashtag => "hashtag",
            Self::Script => "script",
            Self::Description => "description",
            Self::Ai => "ai",
        }
    }
}

/// Both observed classification taxonomies in one enum: hot/potential/weak
/// comes from live search-hit-rate validation, shorttail/longtail from the
/// trend-classification service. The caller picks the producing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordKind {
    #[default]
    Unknown,
    Hot,
    Potential,
    Weak,
    Shorttail,
    Longtail,
}

impl KeywordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Hot => "hot",
            Self::Potential => "potential",
            Self::Weak => "weak",
            Self::Shorttail => "shorttail",
            Self::Longtail => "longtail",
        }
    }

    pub fn from_wire(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "hot" => Self::Hot,
            "potential" => Self::Potential,
            "weak" => Self::Weak,
            "shorttail" | "short_tail" | "short-tail" => Self::Shorttail,
            "longtail" | "long_tail" | "long-tail" => Self::Longtail,
            _ => Self::Unknown,
        }
    }
}

/// How the suggestion service classified the target video itself. Only
/// keyword-driven videos are worth live cross-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoType {
    Keyword,
    Content,
    Unknown,
}

impl VideoType {
    pub fn from_wire(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "keyword" => Self::Keyword,
            "content" => Self::Content,
            _ => Self::Unknown,
        }
    }
}

/// Lightweight summary of a search result that cleared the virality
/// threshold for some keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitVideo {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub view_count: u64,
    pub channel_title: String,
}

/// One ranked keyword produced by an extraction run. Created fresh per run;
/// never persisted directly, only the derived keyword/join rows are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordCandidate {
    pub keyword: String,
    /// The form actually used for provider searches: for AI phrases the
    /// text before any parenthetical, otherwise the keyword itself.
    pub search_keyword: String,
    /// Occurrence count from local extraction; None for AI suggestions.
    pub frequency: Option<u64>,
    pub sources: Vec<KeywordSource>,
    pub kind: KeywordKind,
    /// Trend label from the classification service, passed through as-is.
    pub trend: Option<String>,
    pub hit_videos: Option<u64>,
    pub total_searched: Option<u64>,
    /// Percentage 0–100, rounded.
    pub hit_rate: Option<u8>,
    pub hit_video_list: Vec<HitVideo>,
    pub hashtag_count: Option<u64>,
    pub related_keywords: Vec<String>,
}

impl KeywordCandidate {
    pub fn new(keyword: impl Into<String>, source: KeywordSource) -> Self {
        let keyword = keyword.into();
        Self {
            search_keyword: keyword.clone(),
            keyword,
            frequency: None,
            sources: vec![source],
            kind: KeywordKind::Unknown,
            trend: None,
            hit_videos: None,
            total_searched: None,
            hit_rate: None,
            hit_video_list: Vec::new(),
            hashtag_count: None,
            related_keywords: Vec::new(),
        }
    }

    /// Builds a candidate from a raw AI suggestion like
    /// "budget headphones (rising)"; the search form drops the parenthetical.
    pub fn from_suggestion(raw: &str) -> Self {
        let search = raw.split('(').next().unwrap_or(raw).trim().to_string();
        Self {
            keyword: raw.trim().to_string(),
            search_keyword: search,
            ..Self::new(raw.trim(), KeywordSource::Ai)
        }
    }

    /// Primary source tag for the persisted join row.
    pub fn primary_source(&self) -> Option<KeywordSource> {
        self.sources.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_strips_parenthetical_for_search() {
        let kw = KeywordCandidate::from_suggestion("budget headphones (rising trend)");
        assert_eq!(kw.keyword, "budget headphones (rising trend)");
        assert_eq!(kw.search_keyword, "budget headphones");
        assert_eq!(kw.sources, vec![KeywordSource::Ai]);
        assert_eq!(kw.kind, KeywordKind::Unknown);
    }

    #[test]
    fn suggestion_without_parenthetical_is_unchanged() {
        let kw = KeywordCandidate::from_suggestion("  vlog routine ");
        assert_eq!(kw.keyword, "vlog routine");
        assert_eq!(kw.search_keyword, "vlog routine");
    }

    #[test]
    fn kind_wire_forms() {
        assert_eq!(KeywordKind::from_wire("hot"), KeywordKind::Hot);
        assert_eq!(KeywordKind::from_wire("short_tail"), KeywordKind::Shorttail);
        assert_eq!(KeywordKind::from_wire("LONGTAIL"), KeywordKind::Longtail);
        assert_eq!(KeywordKind::from_wire("???"), KeywordKind::Unknown);
    }

    #[test]
    fn video_type_wire_forms() {
        assert_eq!(VideoType::from_wire("keyword"), VideoType::Keyword);
        assert_eq!(VideoType::from_wire("Content"), VideoType::Content);
        assert_eq!(VideoType::from_wire(""), VideoType::Unknown);
    }
}
