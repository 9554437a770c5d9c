// Burstiness Scorer
// Share of distinct words that recur in the text

use crate::services::text_processor::{word_tokens, FrequencyTable};

use super::error::DetectionError;

/// `repeated distinct tokens / distinct tokens`, in [0, 1].
/// Empty or whitespace-only text has no tokens and is rejected.
pub fn score_burstiness(text: &str) -> Result<f64, DetectionError> {
    let table = FrequencyTable::from_tokens(word_tokens(text));
    burstiness_from_table(&table)
}

pub fn burstiness_from_table(table: &FrequencyTable) -> Result<f64, DetectionError> {
    if table.is_empty() {
        return Err(DetectionError::InvalidInput(
            "text contains no words to measure burstiness".to_string(),
        ));
    }
    Ok(table.repeated() as f64 / table.distinct() as f64)
}
