// Detection Module
// AI text detection core logic organized into specialized submodules:
// - perplexity: language-model perplexity over the whole text
// - burstiness: repeated-word ratio
// - word_frequency: top content words
// - aggregation: score combination and verdict thresholds
// - analyzer: the per-request driver tying the above together

pub mod error;
pub mod perplexity;
pub mod burstiness;
pub mod word_frequency;
pub mod aggregation;
pub mod analyzer;

pub use error::DetectionError;
pub use perplexity::{perplexity_from_logits, PerplexityScore, PerplexityScorer};
pub use burstiness::{burstiness_from_table, score_burstiness};
pub use word_frequency::{top_words, DEFAULT_TOP_WORDS};
pub use aggregation::{
    combine_scores,
    derive_verdict,
    validate_bounds,
    CombinedScore,
    LIKELY_AI_THRESHOLD,
    POSSIBLY_AI_THRESHOLD,
};
pub use analyzer::AnalysisDriver;
