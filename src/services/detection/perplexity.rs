// Perplexity Scorer
// exp(mean next-token cross-entropy) under the injected language model

use crate::services::language_model::LanguageModel;
use std::sync::Arc;
use tracing::debug;

use super::error::DetectionError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerplexityScore {
    pub perplexity: f64,
    pub token_count: usize,
}

pub struct PerplexityScorer {
    model: Arc<dyn LanguageModel>,
}

impl PerplexityScorer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn score(&self, text: &str) -> Result<f64, DetectionError> {
        self.score_detailed(text).map(|s| s.perplexity)
    }

    /// Encode without special markers, reject over-long input, run the
    /// oracle once and reduce its logits to a perplexity.
    pub fn score_detailed(&self, text: &str) -> Result<PerplexityScore, DetectionError> {
        let ids = self.model.encode(text)?;
        if ids.is_empty() {
            return Err(DetectionError::InvalidInput(
                "text produced no tokens to score".to_string(),
            ));
        }
        if ids.len() < 2 {
            return Err(DetectionError::InvalidInput(
                "perplexity needs at least two tokens".to_string(),
            ));
        }
        let max = self.model.max_sequence_len();
        if ids.len() > max {
            return Err(DetectionError::SequenceTooLong { len: ids.len(), max });
        }

        let logits = self.model.next_token_logits(&ids)?;
        let perplexity = perplexity_from_logits(&logits, &ids)?;
        debug!(
            "[PERPLEXITY] model={} tokens={} ppl={:.4}",
            self.model.name(),
            ids.len(),
            perplexity
        );

        Ok(PerplexityScore {
            perplexity,
            token_count: ids.len(),
        })
    }
}

/// Row `i` of `logits` predicts `ids[i + 1]`; the last row has no target.
pub fn perplexity_from_logits(logits: &[Vec<f32>], ids: &[u32]) -> Result<f64, DetectionError> {
    if logits.len() != ids.len() {
        return Err(DetectionError::OracleUnavailable(format!(
            "model returned {} logit rows for {} tokens",
            logits.len(),
            ids.len()
        )));
    }
    if ids.len() < 2 {
        return Err(DetectionError::InvalidInput(
            "perplexity needs at least two tokens".to_string(),
        ));
    }

    let mut total_nll = 0.0;
    for (row, &target) in logits.iter().zip(ids.iter().skip(1)) {
        total_nll -= log_softmax_at(row, target as usize)?;
    }
    let mean_nll = total_nll / (ids.len() - 1) as f64;
    let perplexity = mean_nll.exp();
    if !mean_nll.is_finite() || !perplexity.is_finite() {
        return Err(DetectionError::OracleUnavailable(format!(
            "model produced non-finite cross-entropy ({})",
            mean_nll
        )));
    }

    Ok(perplexity)
}

fn log_softmax_at(row: &[f32], target: usize) -> Result<f64, DetectionError> {
    let Some(&target_logit) = row.get(target) else {
        return Err(DetectionError::OracleUnavailable(format!(
            "token id {} outside logit row of {}",
            target,
            row.len()
        )));
    };
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let log_sum_exp = row
        .iter()
        .map(|&l| (l as f64 - max).exp())
        .sum::<f64>()
        .ln()
        + max;
    Ok(target_logit as f64 - log_sum_exp)
}
