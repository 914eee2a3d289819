use std::collections::HashMap;

use crate::core::keywords::wordlists::{has_hangul, Wordlists};
use crate::core::models::keyword::{KeywordCandidate, KeywordSource};

/// Ranked keywords returned per extraction.
pub const MAX_CANDIDATES: usize = 15;
/// Title occurrences count this many times more than other segments.
const TITLE_WEIGHT: u64 = 3;
/// Flat score bonus for hashtags the creator chose explicitly.
const HASHTAG_BONUS: f64 = 10.0;

/// Offline frequency-based extraction. Counts unigrams and adjacent-pair
/// bigrams across the video's text segments, scores them with phrase and
/// whitelist multipliers, and keeps the top candidates.
pub struct LexicalStrategy {
    lists: Wordlists,
}

impl Default for LexicalStrategy {
    fn default() -> Self {
        Self {
            lists: Wordlists::default(),
        }
    }
}

/// Text inputs for one extraction run.
#[derive(Debug, Clone, Default)]
pub struct ExtractionInput {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub transcript: Option<String>,
}

#[derive(Default)]
struct CandidateStats {
    count: u64,
    per_source: HashMap<&'static str, u64>,
    hashtag: bool,
    whitelisted: bool,
}

impl LexicalStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rank(&self, input: &ExtractionInput) -> Vec<KeywordCandidate> {
        let mut stats: HashMap<String, CandidateStats> = HashMap::new();

        for tag in hashtags_in(&input.title).chain(hashtags_in(&input.description)) {
            let key = tag.to_lowercase();
            if key.chars().count() < 2 {
                continue;
            }
            let entry = stats.entry(key).or_default();
            entry.count += 1;
            entry.hashtag = true;
            entry.whitelisted |= self.lists.is_whitelisted(&tag);
            *entry.per_source.entry("hashtag").or_default() += 1;
        }

        self.count_segment(&mut stats, "title", &input.title, TITLE_WEIGHT);
        for tag in &input.tags {
            self.count_segment(&mut stats, "tag", tag, 1);
        }
        self.count_segment(&mut stats, "description", &input.description, 1);
        if let Some(transcript) = &input.transcript {
            self.count_segment(&mut stats, "script", transcript, 1);
        }

        let mut scored: Vec<(String, CandidateStats, f64)> = stats
            .into_iter()
            .map(|(keyword, s)| {
                let score = score(&keyword, &s);
                (keyword, s, score)
            })
            .collect();
        scored.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.count.cmp(&a.1.count))
                .then_with(|| a.0.cmp(&b.0))
        });

        scored
            .into_iter()
            .take(MAX_CANDIDATES)
            .map(|(keyword, s, _)| {
                let mut candidate = KeywordCandidate::new(keyword, primary_source(&s));
                candidate.frequency = Some(s.count);
                candidate.sources = source_tags(&s);
                candidate
            })
            .collect()
    }

    fn count_segment(
        &self,
        stats: &mut HashMap<String, CandidateStats>,
        source: &'static str,
        text: &str,
        weight: u64,
    ) {
        let cleaned = strip_hashtags(text);
        let tokens: Vec<String> = tokenize(&cleaned);

        for token in &tokens {
            if !self.lists.accepts(token) {
                continue;
            }
            self.bump(stats, token.to_lowercase(), source, weight, self.lists.is_whitelisted(token));
        }

        // Adjacent-pair phrases; either side may be a stopword-free token
        // only, and the pair must fit the same length floor per word.
        for pair in tokens.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            if !self.lists.accepts(left) || !self.lists.accepts(right) {
                continue;
            }
            let phrase = format!("{} {}", left.to_lowercase(), right.to_lowercase());
            let whitelisted =
                self.lists.is_whitelisted(left) || self.lists.is_whitelisted(right);
            self.bump(stats, phrase, source, weight, whitelisted);
        }
    }

    fn bump(
        &self,
        stats: &mut HashMap<String, CandidateStats>,
        keyword: String,
        source: &'static str,
        weight: u64,
        whitelisted: bool,
    ) {
        let entry = stats.entry(keyword).or_default();
        entry.count += weight;
        entry.whitelisted |= whitelisted;
        *entry.per_source.entry(source).or_default() += weight;
    }
}

fn score(keyword: &str, stats: &CandidateStats) -> f64 {
    let mut score = stats.count as f64;
    if keyword.contains(' ') {
        score *= 2.0;
    }
    if has_hangul(keyword) && keyword.chars().any(|c| c.is_ascii_alphabetic()) {
        score *= 1.5;
    }
    if stats.whitelisted {
        score *= 1.5;
    }
    if stats.hashtag {
        score += HASHTAG_BONUS;
    }
    score
}

/// Segment tags ranked by where the keyword appeared most, with title as
/// the tiebreak winner.
const SOURCE_PRIORITY: &[(&str, KeywordSource)] = &[
    ("hashtag", KeywordSource::Hashtag),
    ("title", KeywordSource::Title),
    ("tag", KeywordSource::Tag),
    ("script", KeywordSource::Script),
    ("description", KeywordSource::Description),
];

fn primary_source(stats: &CandidateStats) -> KeywordSource {
    source_tags(stats)
        .first()
        .copied()
        .unwrap_or(KeywordSource::Description)
}

fn source_tags(stats: &CandidateStats) -> Vec<KeywordSource> {
    let mut tags: Vec<(u64, usize, KeywordSource)> = SOURCE_PRIORITY
        .iter()
        .enumerate()
        .filter_map(|(priority, (name, source))| {
            stats
                .per_source
                .get(name)
                .map(|&count| (count, priority, *source))
        })
        .collect();
    tags.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    tags.into_iter().map(|(_, _, source)| source).collect()
}

fn strip_hashtags(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !word.starts_with('#'))
        .collect::<Vec<_>>()
        .join(" ")
}

fn hashtags_in(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().filter_map(|word| {
        let tag = word.strip_prefix('#')?;
        let cleaned: String = tag
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    })
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}
