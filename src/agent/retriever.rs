//! Semantic search over the corpus with optional source filtering.

use crate::corpus::{CorpusIndex, DocumentChunk};
use crate::error::Result;
use regex::Regex;
use tracing::debug;

pub const NO_RELEVANT_INFO: &str = "No relevant info was found in the document";

/// Resolves a user-supplied source fragment against known source names.
pub struct SourceMatcher {
    cutoff: f32,
}

impl SourceMatcher {
    pub fn new(cutoff: f32) -> Self {
        Self { cutoff }
    }

    /// Character similarity in `[0, 1]`, `2 * matches / total length`.
    ///
    /// Matches are the characters of a Myers diff (a longest common
    /// subsequence), which scores at least as high as matching the longest
    /// contiguous blocks first. Fragments just under the cutoff by block
    /// matching can therefore resolve here.
    pub fn similarity(a: &str, b: &str) -> f32 {
        similar::TextDiff::from_chars(a, b).ratio()
    }

    /// Best fuzzy match at or above the cutoff.
    pub fn fuzzy_match<'a>(&self, fragment: &str, sources: &'a [String]) -> Option<&'a str> {
        let mut best: Option<(&str, f32)> = None;
        for source in sources {
            let score = Self::similarity(fragment, source);
            if score >= self.cutoff && best.map_or(true, |(_, s)| score > s) {
                best = Some((source.as_str(), score));
            }
        }
        best.map(|(source, _)| source)
    }

    /// Fuzzy match, falling back to a case-insensitive exact match.
    pub fn resolve<'a>(&self, fragment: &str, sources: &'a [String]) -> Option<&'a str> {
        self.fuzzy_match(fragment, sources).or_else(|| {
            let lowered = fragment.to_lowercase();
            sources
                .iter()
                .find(|s| s.to_lowercase() == lowered)
                .map(String::as_str)
        })
    }
}

/// A query split into the text to search for and an optional source filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub search_text: String,
    pub source_filter: Option<String>,
}

/// Searches the corpus and formats chunks with citations.
pub struct RetrieverTool {
    source_pattern: Regex,
    from_pattern: Regex,
    matcher: SourceMatcher,
}

impl RetrieverTool {
    pub fn new(cutoff: f32) -> Self {
        // `source: <name>` takes precedence over `from <name>`
        let source_pattern = Regex::new(r"(?i)\bsource\s*:\s*([^\s,;]+)").expect("Invalid regex");
        let from_pattern =
            Regex::new(r#"(?i)\bfrom\s+["']?([^\s"',;]+)["']?"#).expect("Invalid regex");

        Self {
            source_pattern,
            from_pattern,
            matcher: SourceMatcher::new(cutoff),
        }
    }

    /// Extract the source filter and strip it from the search text.
    pub fn parse_query(&self, query: &str) -> ParsedQuery {
        let captures = self
            .source_pattern
            .captures(query)
            .or_else(|| self.from_pattern.captures(query));

        let Some(caps) = captures else {
            return ParsedQuery {
                search_text: query.trim().to_string(),
                source_filter: None,
            };
        };

        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            return ParsedQuery {
                search_text: query.trim().to_string(),
                source_filter: None,
            };
        };

        let remainder = format!("{} {}", &query[..whole.start()], &query[whole.end()..]);
        let remainder = remainder.split_whitespace().collect::<Vec<_>>().join(" ");
        let fragment = name.as_str().to_string();

        ParsedQuery {
            search_text: if remainder.is_empty() {
                fragment.clone()
            } else {
                remainder
            },
            source_filter: Some(fragment),
        }
    }

    pub async fn run(&self, index: &dyn CorpusIndex, query: &str) -> Result<String> {
        let parsed = self.parse_query(query);
        debug!(
            "Retrieving for {:?} (source filter: {:?})",
            parsed.search_text, parsed.source_filter
        );

        let chunks = index.search(&parsed.search_text).await?;
        if chunks.is_empty() {
            return Ok(NO_RELEVANT_INFO.to_string());
        }

        let mut sources: Vec<String> = Vec::new();
        for source in chunks.iter().filter_map(|c| c.source_file.as_ref()) {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }

        let selected: Vec<&DocumentChunk> = match &parsed.source_filter {
            None => chunks.iter().collect(),
            Some(fragment) => match self.matcher.resolve(fragment, &sources) {
                Some(matched) => {
                    debug!("Source filter {:?} resolved to {}", fragment, matched);
                    chunks
                        .iter()
                        .filter(|c| c.source_file.as_deref() == Some(matched))
                        .collect()
                }
                None => {
                    let available = if sources.is_empty() {
                        "none".to_string()
                    } else {
                        sources.join(", ")
                    };
                    return Ok(format!(
                        "No document found matching '{}'. Available: {}",
                        fragment, available
                    ));
                }
            },
        };

        Ok(format_chunks(&selected))
    }
}

/// Render chunks as numbered documents with citations.
pub fn format_chunks(chunks: &[&DocumentChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "Document {} {}:\n{}",
                i + 1,
                chunk.citation(),
                chunk.content.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
