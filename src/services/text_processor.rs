// Text Processing Service
// Tokenization, stopword filtering and frequency counting shared by the scorers

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// English stopword list (NLTK corpus)
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
    "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
    "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
    "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing",
    "a", "an", "the", "and", "but", "if", "or", "because", "as", "until",
    "while", "of", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
    "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each",
    "few", "more", "most", "other", "some", "such", "no", "nor", "not", "only",
    "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o",
    "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't",
    "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't",
    "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't", "shouldn",
    "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| ENGLISH_STOPWORDS.iter().copied().collect())
}

fn punctuation_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\p{P}\p{S}]+$").expect("punctuation regex"))
}

/// Case-insensitive stopword check
pub fn is_stopword(token: &str) -> bool {
    stopword_set().contains(token.to_lowercase().as_str())
}

/// True when every char is punctuation or a symbol (e.g. "--", "?!", "$").
pub fn is_punctuation_only(token: &str) -> bool {
    punctuation_only_re().is_match(token)
}

/// Lowercased word tokens split on Unicode (UAX #29) word boundaries.
/// Punctuation segments are kept as tokens; whitespace runs are dropped.
pub fn word_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_word_bounds()
        .filter(|seg| !seg.trim().is_empty())
        .map(|seg| seg.to_string())
        .collect()
}

/// Lowercased whitespace-delimited tokens, punctuation left attached.
pub fn whitespace_tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Token occurrence counts that remember first-occurrence order.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl FrequencyTable {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for token in tokens {
            table.add(token.into());
        }
        table
    }

    pub fn add(&mut self, token: String) {
        match self.counts.get_mut(&token) {
            Some(count) => *count += 1,
            None => {
                self.order.push(token.clone());
                self.counts.insert(token, 1);
            }
        }
    }

    #[cfg(test)]
    pub fn count(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn distinct(&self) -> usize {
        self.order.len()
    }

    #[cfg(test)]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of distinct tokens seen more than once
    pub fn repeated(&self) -> usize {
        self.counts.values().filter(|&&c| c > 1).count()
    }

    /// Top `n` entries by descending count; equal counts keep first-occurrence order.
    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> = self
            .order
            .iter()
            .map(|t| (t.clone(), self.counts[t]))
            .collect();
        // sort_by is stable, so ties stay in insertion order
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }
}
