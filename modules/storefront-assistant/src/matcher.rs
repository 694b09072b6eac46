//! Inventory matching: intersect extracted tokens with the live tag and
//! category vocabulary, and pull an optional budget ceiling from the text.
//!
//! There is no hard-coded taxonomy. The vocabulary comes from whatever is
//! active and in stock right now, so matching follows the catalog as it
//! changes.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// A digit group of 4+ digits, or 1-3 digits followed by `.`/`,` thousands
/// groups, optionally after a `$`.
static BUDGET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\$\s*)?(\d{1,3}(?:[.,]\d{3})+|\d{4,})").unwrap());

/// Distinct tags and categories of active, in-stock catalog items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl Vocabulary {
    /// Lowercases, trims, drops empty entries and duplicates.
    pub fn new<T, C>(tags: T, categories: C) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            tags: normalize_entries(tags),
            categories: normalize_entries(categories),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.categories.is_empty()
    }
}

fn normalize_entries<I>(entries: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .map(|e| e.as_ref().trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .filter(|e| seen.insert(e.clone()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// Lowercase terms for the catalog query. Empty only when the message
    /// produced no tokens.
    pub search_terms: Vec<String>,
    pub matched_from_tags: Vec<String>,
    pub matched_from_categories: Vec<String>,
    /// True when nothing matched the vocabulary and raw tokens were used.
    pub used_raw_tokens: bool,
    pub budget: Option<f64>,
}

/// Match `tokens` against `vocabulary` and extract the budget from `message`.
pub fn match_inventory(message: &str, tokens: &[String], vocabulary: &Vocabulary) -> MatchOutcome {
    let matched_from_tags = matching_entries(&vocabulary.tags, tokens);
    let matched_from_categories = matching_entries(&vocabulary.categories, tokens);

    let mut seen = HashSet::new();
    let union: Vec<String> = matched_from_tags
        .iter()
        .chain(matched_from_categories.iter())
        .filter(|e| seen.insert(e.as_str()))
        .cloned()
        .collect();

    let used_raw_tokens = union.is_empty();
    let search_terms = if used_raw_tokens {
        tokens.iter().map(|t| t.to_lowercase()).collect()
    } else {
        union
    };

    MatchOutcome {
        search_terms,
        matched_from_tags,
        matched_from_categories,
        used_raw_tokens,
        budget: extract_budget(message),
    }
}

/// Entries that contain a token or are contained by one.
fn matching_entries(entries: &[String], tokens: &[String]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| {
            tokens
                .iter()
                .any(|token| entry.contains(token.as_str()) || token.contains(entry.as_str()))
        })
        .cloned()
        .collect()
}

/// First strictly positive amount written as a 4+ digit group, with `.`
/// and `,` treated as thousands separators.
pub fn extract_budget(message: &str) -> Option<f64> {
    BUDGET_RE
        .captures_iter(message)
        .filter_map(|caps| {
            let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse::<f64>().ok()
        })
        .find(|amount| *amount > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn vocabulary_is_normalized() {
        let vocab = Vocabulary::new(["Gaming", " gaming ", "", "RGB"], ["Laptops", "laptops"]);
        assert_eq!(vocab.tags, vec!["gaming", "rgb"]);
        assert_eq!(vocab.categories, vec!["laptops"]);
    }

    #[test]
    fn containment_is_bidirectional() {
        let vocab = Vocabulary::new(["gaming", "pc"], ["laptops", "monitores"]);
        let outcome = match_inventory("", &tokens(&["laptop", "pcs"]), &vocab);

        // "laptops" contains "laptop"; "pcs" contains "pc"
        assert_eq!(outcome.matched_from_tags, vec!["pc"]);
        assert_eq!(outcome.matched_from_categories, vec!["laptops"]);
        assert_eq!(outcome.search_terms, vec!["pc", "laptops"]);
        assert!(!outcome.used_raw_tokens);
    }

    #[test]
    fn union_deduplicates_across_tags_and_categories() {
        let vocab = Vocabulary::new(["audio"], ["audio"]);
        let outcome = match_inventory("", &tokens(&["audio"]), &vocab);
        assert_eq!(outcome.search_terms, vec!["audio"]);
    }

    #[test]
    fn falls_back_to_raw_tokens_without_vocabulary_match() {
        let vocab = Vocabulary::new(["mouse"], ["perifericos"]);
        let raw = tokens(&["quiero", "una", "laptop"]);
        let outcome = match_inventory("quiero una laptop", &raw, &vocab);
        assert_eq!(outcome.search_terms, raw);
        assert!(outcome.used_raw_tokens);
    }

    #[test]
    fn empty_vocabulary_degrades_to_raw_tokens() {
        let raw = tokens(&["laptop"]);
        let outcome = match_inventory("laptop", &raw, &Vocabulary::default());
        assert_eq!(outcome.search_terms, raw);
    }

    #[test]
    fn no_tokens_means_no_terms() {
        let outcome = match_inventory("hola", &[], &Vocabulary::new(["mouse"], ["laptops"]));
        assert!(outcome.search_terms.is_empty());
    }

    #[test]
    fn budget_with_dot_thousands_and_currency() {
        assert_eq!(extract_budget("busco algo por $2.500.000"), Some(2_500_000.0));
        assert_eq!(extract_budget("hasta 1,200,000 pesos"), Some(1_200_000.0));
        assert_eq!(extract_budget("tengo $ 4500"), Some(4500.0));
    }

    #[test]
    fn no_budget_without_a_long_digit_group() {
        assert_eq!(extract_budget("necesito un mouse"), None);
        assert_eq!(extract_budget("monitor de 27 pulgadas"), None);
        assert_eq!(extract_budget("cable de 1.5 metros"), None);
    }

    #[test]
    fn zero_amounts_are_skipped() {
        assert_eq!(extract_budget("0000 o 3.000"), Some(3000.0));
        assert_eq!(extract_budget("0.000"), None);
    }
}
