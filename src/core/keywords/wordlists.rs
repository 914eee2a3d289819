//! Token acceptance tables for lexical extraction. Korean and English are
//! the supported source languages; everything else passes through the
//! generic rules.

/// Tokens that never stand alone as keywords. They may still appear inside
/// accepted two-word phrases.
const STOPWORDS: &[&str] = &[
    // English function words
    "a", "an", "the", "and", "or", "but", "if", "then", "this", "that",
    "these", "those", "is", "are", "was", "were", "be", "been", "being",
    "to", "of", "in", "on", "at", "by", "for", "with", "about", "into",
    "from", "as", "it", "its", "my", "your", "our", "their", "his", "her",
    "you", "we", "they", "he", "she", "i", "me", "us", "them", "not", "no",
    "so", "too", "very", "just", "only", "also", "more", "most", "some",
    "any", "all", "can", "will", "would", "should", "could", "do", "does",
    "did", "have", "has", "had", "get", "got", "go", "going", "how", "what",
    "when", "where", "why", "who", "which",
    // platform boilerplate
    "video", "youtube", "subscribe", "like", "comment", "channel", "watch",
    "please", "today", "new", "official", "full", "episode", "part",
    // Korean particles and fillers
    "이", "가", "은", "는", "을", "를", "의", "에", "에서", "으로", "로",
    "와", "과", "도", "만", "까지", "부터", "보다", "처럼", "같이", "하고",
    "그리고", "하지만", "그래서", "그런데", "저는", "제가", "우리", "오늘",
    "진짜", "정말", "너무", "좀", "이제", "그냥", "여러분", "구독", "좋아요",
    "영상", "채널", "시청",
];

/// Korean verb and connective endings. A token ending with one of these is
/// almost always a conjugated verb fragment, not a searchable noun.
const HANGUL_SUFFIX_BLACKLIST: &[&str] = &[
    "습니다", "입니다", "합니다", "됩니다", "했어요", "해요", "에요", "예요",
    "네요", "거든요", "잖아요", "던데요", "는데요", "세요", "셨어요",
    "하면", "하니까", "해서", "하고요", "인데", "라서", "지만", "면서",
];

/// Korean noun-forming endings that mark high-intent search phrases.
const HANGUL_SUFFIX_WHITELIST: &[&str] = &[
    "법", "방법", "추천", "순위", "후기", "리뷰", "비교", "정리", "꿀팁",
    "팁", "강의", "강좌", "배우기", "만들기", "레시피", "여행", "코스",
];

/// Standalone quality markers kept even when short.
const QUALITY_WORDS: &[&str] = &[
    "최고", "최신", "인기", "무료", "초보", "고급", "실전", "총정리",
    "best", "top", "free", "beginner", "advanced", "review", "tutorial",
    "guide", "tips", "ranking", "vs",
];

pub fn has_hangul(text: &str) -> bool {
    text.chars().any(|c| {
        let cp = c as u32;
        (0xAC00..=0xD7A3).contains(&cp) || (0x1100..=0x11FF).contains(&cp) || (0x3130..=0x318F).contains(&cp)
    })
}

/// Acceptance and scoring tables, kept as data so tests can extend them.
pub struct Wordlists {
    stopwords: Vec<&'static str>,
    hangul_blacklist_suffixes: Vec<&'static str>,
    hangul_whitelist_suffixes: Vec<&'static str>,
    quality_words: Vec<&'static str>,
}

impl Default for Wordlists {
    fn default() -> Self {
        Self {
            stopwords: STOPWORDS.to_vec(),
            hangul_blacklist_suffixes: HANGUL_SUFFIX_BLACKLIST.to_vec(),
            hangul_whitelist_suffixes: HANGUL_SUFFIX_WHITELIST.to_vec(),
            quality_words: QUALITY_WORDS.to_vec(),
        }
    }
}

impl Wordlists {
    pub fn is_stopword(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        self.stopwords.iter().any(|s| *s == lower)
    }

    /// True when a token should be rejected outright: pure digits, single
    /// characters, or a conjugated Korean verb ending.
    pub fn is_blacklisted(&self, token: &str) -> bool {
        if token.chars().count() <= 1 {
            return true;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
        if has_hangul(token)
            && self
                .hangul_blacklist_suffixes
                .iter()
                .any(|suffix| token.ends_with(suffix))
        {
            return true;
        }
        false
    }

    /// True when a token earns the whitelist score boost: noun-forming
    /// Korean suffix, quality marker, number-with-unit, all-caps acronym
    /// or a capitalized proper noun.
    pub fn is_whitelisted(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        if self.quality_words.iter().any(|w| *w == lower) {
            return true;
        }
        if has_hangul(token)
            && self
                .hangul_whitelist_suffixes
                .iter()
                .any(|suffix| token.ends_with(suffix))
        {
            return true;
        }
        if is_number_with_unit(token) {
            return true;
        }
        if is_acronym(token) {
            return true;
        }
        if is_capitalized_word(token) {
            return true;
        }
        false
    }

    /// Acceptance rule for a standalone token.
    pub fn accepts(&self, token: &str) -> bool {
        if self.is_blacklisted(token) || self.is_stopword(token) {
            return false;
        }
        let min_len = if has_hangul(token) { 3 } else { 2 };
        if token.chars().count() < min_len {
            return false;
        }
        true
    }
}

/// "3가지", "10kg", "5things": digits followed by letters.
fn is_number_with_unit(token: &str) -> bool {
    let mut chars = token.chars();
    let mut saw_digit = false;
    for c in chars.by_ref() {
        if c.is_ascii_digit() {
            saw_digit = true;
        } else {
            return saw_digit && token.chars().any(|c| c.is_alphabetic());
        }
    }
    false
}

fn is_acronym(token: &str) -> bool {
    token.chars().count() >= 2 && token.chars().all(|c| c.is_ascii_uppercase())
}

fn is_capitalized_word(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => chars.all(|c| c.is_ascii_lowercase()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hangul_detection() {
        assert!(has_hangul("서울여행"));
        assert!(has_hangul("mixed 한글"));
        assert!(!has_hangul("english only"));
    }

    #[test]
    fn stopwords_rejected_case_insensitively() {
        let lists = Wordlists::default();
        assert!(lists.is_stopword("The"));
        assert!(lists.is_stopword("subscribe"));
        assert!(lists.is_stopword("그리고"));
        assert!(!lists.is_stopword("headphones"));
    }

    #[test]
    fn blacklist_rules() {
        let lists = Wordlists::default();
        assert!(lists.is_blacklisted("7"));
        assert!(lists.is_blacklisted("2024"));
        assert!(lists.is_blacklisted("x"));
        assert!(lists.is_blacklisted("좋았습니다"));
        assert!(lists.is_blacklisted("간다해서"));
        assert!(!lists.is_blacklisted("서울여행"));
        assert!(!lists.is_blacklisted("headphones"));
    }

    #[test]
    fn whitelist_rules() {
        let lists = Wordlists::default();
        assert!(lists.is_whitelisted("요리법"));
        assert!(lists.is_whitelisted("맛집추천"));
        assert!(lists.is_whitelisted("review"));
        assert!(lists.is_whitelisted("3가지"));
        assert!(lists.is_whitelisted("10kg"));
        assert!(lists.is_whitelisted("ANC"));
        assert!(lists.is_whitelisted("Seoul"));
        assert!(!lists.is_whitelisted("headphones"));
        assert!(!lists.is_whitelisted("서울"));
    }

    #[test]
    fn acceptance_length_floor_depends_on_script() {
        let lists = Wordlists::default();
        assert!(lists.accepts("ab"));
        assert!(!lists.accepts("서울")); // two Hangul syllables, floor is three
        assert!(lists.accepts("서울시"));
        assert!(!lists.accepts("the"));
        assert!(!lists.accepts("99"));
    }
}
