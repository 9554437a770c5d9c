// GPT Shield Core Services

pub mod text_processor;
pub mod config_store;
pub mod language_model;
pub mod detection;

pub use text_processor::*;
pub use config_store::*;
pub use language_model::*;

// Re-export detection module items
pub use detection::{
    combine_scores,
    derive_verdict,
    score_burstiness,
    top_words,
    AnalysisDriver,
    DetectionError,
    PerplexityScorer,
};
