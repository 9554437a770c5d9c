// GPT Shield Data Models
// Result types shared by the detection services, the api layer and the CLI

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============ Normalization Bounds ============

pub const MIN_PERPLEXITY: f64 = 0.0;
pub const MAX_PERPLEXITY: f64 = 60000.0;
pub const MIN_BURSTINESS: f64 = 0.0;
pub const MAX_BURSTINESS: f64 = 1.0;

/// Linear normalization ranges used when combining perplexity and burstiness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationBounds {
    #[serde(default = "default_min_perplexity")]
    pub min_perplexity: f64,
    #[serde(default = "default_max_perplexity")]
    pub max_perplexity: f64,
    #[serde(default = "default_min_burstiness")]
    pub min_burstiness: f64,
    #[serde(default = "default_max_burstiness")]
    pub max_burstiness: f64,
}

impl Default for NormalizationBounds {
    fn default() -> Self {
        Self {
            min_perplexity: MIN_PERPLEXITY,
            max_perplexity: MAX_PERPLEXITY,
            min_burstiness: MIN_BURSTINESS,
            max_burstiness: MAX_BURSTINESS,
        }
    }
}

fn default_min_perplexity() -> f64 { MIN_PERPLEXITY }
fn default_max_perplexity() -> f64 { MAX_PERPLEXITY }
fn default_min_burstiness() -> f64 { MIN_BURSTINESS }
fn default_max_burstiness() -> f64 { MAX_BURSTINESS }

// ============ Verdict ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    LikelyAi,
    PossiblyAi,
    LikelyHuman,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::LikelyAi => "Highly likely AI generated",
            Verdict::PossiblyAi => "Moderately likely AI generated",
            Verdict::LikelyHuman => "Likely not generated by AI",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============ Analysis Result ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub perplexity: f64,
    pub burstiness: f64,
    /// Clamped to [0, 100]
    pub ai_likelihood_percent: f64,
    pub raw_ai_likelihood_percent: f64,
    pub verdict: Verdict,
    pub token_count: usize,
}

impl AnalysisResult {
    /// Compares the score fields only; id and timestamp differ per call.
    #[cfg(test)]
    pub fn same_scores(&self, other: &AnalysisResult) -> bool {
        self.perplexity == other.perplexity
            && self.burstiness == other.burstiness
            && self.ai_likelihood_percent == other.ai_likelihood_percent
            && self.raw_ai_likelihood_percent == other.raw_ai_likelihood_percent
            && self.verdict == other.verdict
            && self.token_count == other.token_count
    }
}

// ============ Word Frequency ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

impl WordCount {
    pub fn new(word: impl Into<String>, count: usize) -> Self {
        Self { word: word.into(), count }
    }
}

// ============ Report ============

/// Everything a front end needs to render one analysis: the echoed input,
/// the detection score panel and the ranked word list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub input: String,
    pub analysis: AnalysisResult,
    pub top_words: Vec<WordCount>,
}
