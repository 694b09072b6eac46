//! Term extraction: raw user text to a deduplicated set of significant tokens.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Tokens shorter than this (in characters) are ignored.
pub const MIN_TERM_CHARS: usize = 3;

/// Maximal runs of Latin letters, Spanish accented vowels, ñ and digits.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9áéíóúüñ]+").unwrap());

/// Case-insensitive set of words to ignore. Empty by default.
#[derive(Debug, Clone, Default)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Lowercase `message` and return its significant tokens, each unique.
/// Pure; empty input yields an empty set.
pub fn extract_terms(message: &str, stopwords: &StopwordSet) -> Vec<String> {
    let lowered = message.to_lowercase();
    let mut seen = HashSet::new();

    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().trim())
        .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
        .filter(|t| !stopwords.contains(t))
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}
