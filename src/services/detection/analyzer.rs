// Analysis Driver
// Validates input, runs both scorers and turns the combined score into a verdict

use crate::models::{AnalysisResult, NormalizationBounds};
use crate::services::language_model::LanguageModel;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use super::aggregation::{combine_scores, derive_verdict, validate_bounds};
use super::burstiness::score_burstiness;
use super::error::DetectionError;
use super::perplexity::PerplexityScorer;

pub struct AnalysisDriver {
    perplexity: PerplexityScorer,
    bounds: NormalizationBounds,
}

impl AnalysisDriver {
    pub fn new(model: Arc<dyn LanguageModel>, bounds: NormalizationBounds) -> Result<Self, DetectionError> {
        validate_bounds(&bounds)?;
        Ok(Self {
            perplexity: PerplexityScorer::new(model),
            bounds,
        })
    }

    /// Errors from either scorer propagate unchanged; nothing is substituted.
    pub fn analyze(&self, text: &str) -> Result<AnalysisResult, DetectionError> {
        let analysis_id = Uuid::new_v4();
        let span = info_span!("analysis", analysis_id = %analysis_id);
        let _enter = span.enter();
        let t0 = Instant::now();

        let result = self.analyze_inner(analysis_id, text);
        match &result {
            Ok(r) => info!(
                model = self.perplexity.model_name(),
                tokens = r.token_count,
                perplexity = r.perplexity,
                burstiness = r.burstiness,
                percent = r.ai_likelihood_percent,
                verdict = ?r.verdict,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "analysis.completed"
            ),
            Err(e) => warn!("[ANALYZER] analysis failed: {}", e),
        }
        result
    }

    fn analyze_inner(&self, analysis_id: Uuid, text: &str) -> Result<AnalysisResult, DetectionError> {
        if text.trim().is_empty() {
            return Err(DetectionError::InvalidInput(
                "text is empty or whitespace only".to_string(),
            ));
        }

        let ppl = self.perplexity.score_detailed(text)?;
        let burstiness = score_burstiness(text)?;
        let combined = combine_scores(ppl.perplexity, burstiness, &self.bounds)?;

        if combined.raw_percent != combined.percent {
            info!(
                "[ANALYZER] raw percentage {:.2} clamped to {:.2}",
                combined.raw_percent, combined.percent
            );
        }

        Ok(AnalysisResult {
            analysis_id,
            analyzed_at: Utc::now(),
            perplexity: ppl.perplexity,
            burstiness,
            ai_likelihood_percent: combined.percent,
            raw_ai_likelihood_percent: combined.raw_percent,
            verdict: derive_verdict(combined.percent),
            token_count: ppl.token_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Verdict;
    use crate::services::language_model::{BigramLanguageModel, BigramModelFile, OracleError, UNK_TOKEN};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn uniform_model(vocab_size: usize, max_sequence_len: usize) -> Arc<dyn LanguageModel> {
        let mut vocab = vec![UNK_TOKEN.to_string()];
        vocab.extend((1..vocab_size).map(|i| format!("w{}", i)));
        Arc::new(
            BigramLanguageModel::from_model_file(BigramModelFile {
                name: "uniform".to_string(),
                max_sequence_len,
                smoothing: 1.0,
                vocab,
                bigrams: vec![],
            })
            .unwrap(),
        )
    }

    /// Counts oracle calls so validation ordering can be checked.
    struct CountingModel {
        calls: AtomicUsize,
    }

    impl LanguageModel for CountingModel {
        fn name(&self) -> &str {
            "counting"
        }
        fn max_sequence_len(&self) -> usize {
            1024
        }
        fn encode(&self, text: &str) -> Result<Vec<u32>, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.split_whitespace().map(|_| 0).collect())
        }
        fn next_token_logits(&self, ids: &[u32]) -> Result<Vec<Vec<f32>>, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ids.iter().map(|_| vec![0.0, 0.0]).collect())
        }
    }

    struct UnavailableModel;

    impl LanguageModel for UnavailableModel {
        fn name(&self) -> &str {
            "unavailable"
        }
        fn max_sequence_len(&self) -> usize {
            1024
        }
        fn encode(&self, _text: &str) -> Result<Vec<u32>, OracleError> {
            Err(OracleError::MissingModel)
        }
        fn next_token_logits(&self, _ids: &[u32]) -> Result<Vec<Vec<f32>>, OracleError> {
            Err(OracleError::MissingModel)
        }
    }

    #[test]
    fn test_empty_input_rejected_before_scoring() {
        let model = Arc::new(CountingModel { calls: AtomicUsize::new(0) });
        let driver = AnalysisDriver::new(model.clone(), NormalizationBounds::default()).unwrap();
        assert!(matches!(driver.analyze(""), Err(DetectionError::InvalidInput(_))));
        assert!(matches!(driver.analyze(" \n\t "), Err(DetectionError::InvalidInput(_))));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_analyze_uniform_model() {
        // Uniform over 8 tokens -> perplexity 8; "the the cat" -> burstiness 0.5
        let bounds = NormalizationBounds {
            max_perplexity: 10.0,
            ..NormalizationBounds::default()
        };
        let driver = AnalysisDriver::new(uniform_model(8, 64), bounds).unwrap();
        let result = driver.analyze("the the cat").unwrap();
        assert!((result.perplexity - 8.0).abs() < 1e-4);
        assert_eq!(result.burstiness, 0.5);
        assert!((result.ai_likelihood_percent - 40.0).abs() < 1e-3);
        assert_eq!(result.verdict, Verdict::LikelyHuman);
        assert_eq!(result.token_count, 3);
    }

    #[test]
    fn test_analyze_clamps_and_flags_ai() {
        let bounds = NormalizationBounds {
            max_perplexity: 4.0,
            ..NormalizationBounds::default()
        };
        let driver = AnalysisDriver::new(uniform_model(8, 64), bounds).unwrap();
        let result = driver.analyze("one two three four").unwrap();
        assert_eq!(result.burstiness, 0.0);
        assert!(result.raw_ai_likelihood_percent > 100.0);
        assert_eq!(result.ai_likelihood_percent, 100.0);
        assert_eq!(result.verdict, Verdict::LikelyAi);
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let driver = AnalysisDriver::new(uniform_model(16, 64), NormalizationBounds::default()).unwrap();
        let text = "Rust makes systems programming safe. Rust makes it fun too.";
        let first = driver.analyze(text).unwrap();
        for _ in 0..5 {
            let again = driver.analyze(text).unwrap();
            assert!(first.same_scores(&again));
        }
    }

    #[test]
    fn test_default_bounds_give_low_percentage_for_small_perplexity() {
        let driver = AnalysisDriver::new(uniform_model(16, 64), NormalizationBounds::default()).unwrap();
        let result = driver.analyze("a quick note about nothing").unwrap();
        assert!(result.ai_likelihood_percent < 1.0);
        assert_eq!(result.verdict, Verdict::LikelyHuman);
    }

    #[test]
    fn test_oracle_unavailable_propagates() {
        let driver = AnalysisDriver::new(Arc::new(UnavailableModel), NormalizationBounds::default()).unwrap();
        assert!(matches!(
            driver.analyze("some text here"),
            Err(DetectionError::OracleUnavailable(_))
        ));
    }

    #[test]
    fn test_too_long_propagates_and_next_call_succeeds() {
        let driver = AnalysisDriver::new(uniform_model(8, 5), NormalizationBounds::default()).unwrap();
        assert!(matches!(
            driver.analyze("one two three four five six"),
            Err(DetectionError::SequenceTooLong { len: 6, max: 5 })
        ));
        assert!(driver.analyze("one two three").is_ok());
    }

    #[test]
    fn test_invalid_bounds_rejected_at_construction() {
        let bounds = NormalizationBounds {
            min_burstiness: 1.0,
            ..NormalizationBounds::default()
        };
        assert!(matches!(
            AnalysisDriver::new(uniform_model(4, 8), bounds),
            Err(DetectionError::InvalidConfig(_))
        ));
    }
}
