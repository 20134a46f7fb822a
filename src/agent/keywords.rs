//! Frequency-based keyword extraction for query expansion.

use crate::config::{MAX_EXPANSION_KEYWORDS, MIN_KEYWORD_LEN};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Words never used as expansion terms.
const STOPWORDS: &[&str] = &[
    "o", "a", "os", "as", "de", "da", "do", "das", "dos", "em", "no", "na", "que", "para", "com",
    "é", "um", "uma", "e", "ou", "se", "não", "ser", "ter", "fazer", "dizer", "colaborai",
    "@colaborai", "user", "assistant", "sobre", "mais", "como", "mas", "por", "ao", "aos", "sua",
    "seu", "isso", "esse", "essa", "então", "já", "também", "onde", "quando", "qual",
];

/// Extracts the most frequent salient terms of a conversation excerpt.
pub struct KeywordExtractor {
    stopwords: HashSet<&'static str>,
    min_len: usize,
    max_keywords: usize,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(MIN_KEYWORD_LEN, MAX_EXPANSION_KEYWORDS)
    }
}

impl KeywordExtractor {
    /// Tokens must be strictly longer than `min_len` characters.
    pub fn new(min_len: usize, max_keywords: usize) -> Self {
        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
            min_len,
            max_keywords,
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Top keywords by frequency, ties broken by first appearance.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut counts: IndexMap<&str, usize> = IndexMap::new();

        for token in lowered.split_whitespace() {
            if token.chars().count() > self.min_len
                && token.chars().all(char::is_alphabetic)
                && !self.is_stopword(token)
            {
                *counts.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        // Stable sort keeps first-appearance order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        ranked
            .into_iter()
            .take(self.max_keywords)
            .map(|(word, _)| word.to_string())
            .collect()
    }

    /// `topic` followed by the extracted keywords, trimmed.
    pub fn expand(&self, topic: &str, text: &str) -> String {
        let keywords = self.extract(text);
        if keywords.is_empty() {
            return topic.to_string();
        }
        format!("{} {}", topic, keywords.join(" ")).trim().to_string()
    }
}
