// Word Frequency Analyzer
// Ranks the most repeated content words for the "basic details" panel

use crate::models::WordCount;
use crate::services::text_processor::{
    is_punctuation_only, is_stopword, whitespace_tokens, FrequencyTable,
};

pub const DEFAULT_TOP_WORDS: usize = 10;

/// Top `n` whitespace tokens by count, skipping stopwords and
/// punctuation-only tokens. Ties keep first-occurrence order.
pub fn top_words(text: &str, n: usize) -> Vec<WordCount> {
    if n == 0 {
        return Vec::new();
    }

    let table = FrequencyTable::from_tokens(
        whitespace_tokens(text)
            .into_iter()
            .filter(|t| !is_stopword(t) && !is_punctuation_only(t)),
    );

    table
        .most_common(n)
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect()
}
