// Score Aggregation
// Combines normalized perplexity and burstiness into an AI-likelihood percentage and verdict

use crate::models::{NormalizationBounds, Verdict};

use super::error::DetectionError;

/// Strictly above this percentage the text is "highly likely" AI.
pub const LIKELY_AI_THRESHOLD: f64 = 75.0;
/// Strictly above this percentage the text is "moderately likely" AI.
pub const POSSIBLY_AI_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedScore {
    pub raw_percent: f64,
    /// raw_percent clamped to [0, 100]
    pub percent: f64,
}

pub fn validate_bounds(bounds: &NormalizationBounds) -> Result<(), DetectionError> {
    let all_finite = [
        bounds.min_perplexity,
        bounds.max_perplexity,
        bounds.min_burstiness,
        bounds.max_burstiness,
    ]
    .iter()
    .all(|v| v.is_finite());
    if !all_finite {
        return Err(DetectionError::InvalidConfig(
            "normalization bounds must be finite".to_string(),
        ));
    }
    if bounds.max_perplexity <= bounds.min_perplexity {
        return Err(DetectionError::InvalidConfig(format!(
            "maxPerplexity ({}) must exceed minPerplexity ({})",
            bounds.max_perplexity, bounds.min_perplexity
        )));
    }
    if bounds.max_burstiness <= bounds.min_burstiness {
        return Err(DetectionError::InvalidConfig(format!(
            "maxBurstiness ({}) must exceed minBurstiness ({})",
            bounds.max_burstiness, bounds.min_burstiness
        )));
    }
    Ok(())
}

/// normalized(perplexity) * (1 - normalized(burstiness)) * 100
///
/// This is a heuristic product, not a calibrated probability. Perplexity above
/// `max_perplexity` pushes the raw value past 100, so the reported percentage
/// is clamped and the raw product kept alongside it.
pub fn combine_scores(
    perplexity: f64,
    burstiness: f64,
    bounds: &NormalizationBounds,
) -> Result<CombinedScore, DetectionError> {
    validate_bounds(bounds)?;

    let ppl_factor =
        (perplexity - bounds.min_perplexity) / (bounds.max_perplexity - bounds.min_perplexity);
    let burst_factor =
        (bounds.max_burstiness - burstiness) / (bounds.max_burstiness - bounds.min_burstiness);
    let raw_percent = ppl_factor * burst_factor * 100.0;

    Ok(CombinedScore {
        raw_percent,
        percent: raw_percent.clamp(0.0, 100.0),
    })
}

pub fn derive_verdict(percent: f64) -> Verdict {
    if percent > LIKELY_AI_THRESHOLD {
        Verdict::LikelyAi
    } else if percent > POSSIBLY_AI_THRESHOLD {
        Verdict::PossiblyAi
    } else {
        Verdict::LikelyHuman
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_boundaries() {
        assert_eq!(derive_verdict(75.0), Verdict::PossiblyAi);
        assert_eq!(derive_verdict(75.0001), Verdict::LikelyAi);
        assert_eq!(derive_verdict(50.0), Verdict::LikelyHuman);
        assert_eq!(derive_verdict(50.0001), Verdict::PossiblyAi);
        assert_eq!(derive_verdict(0.0), Verdict::LikelyHuman);
        assert_eq!(derive_verdict(100.0), Verdict::LikelyAi);
    }

    #[test]
    fn test_combine_default_bounds() {
        let bounds = NormalizationBounds::default();
        let score = combine_scores(30000.0, 0.5, &bounds).unwrap();
        assert!((score.raw_percent - 25.0).abs() < 1e-9);
        assert_eq!(score.percent, score.raw_percent);
    }

    #[test]
    fn test_combine_full_burstiness_is_zero() {
        let score = combine_scores(45000.0, 1.0, &NormalizationBounds::default()).unwrap();
        assert_eq!(score.percent, 0.0);
    }

    #[test]
    fn test_combine_clamps_above_bound() {
        let score = combine_scores(120000.0, 0.0, &NormalizationBounds::default()).unwrap();
        assert!((score.raw_percent - 200.0).abs() < 1e-9);
        assert_eq!(score.percent, 100.0);
        assert_eq!(derive_verdict(score.percent), Verdict::LikelyAi);
    }

    #[test]
    fn test_custom_bounds() {
        let bounds = NormalizationBounds {
            min_perplexity: 10.0,
            max_perplexity: 110.0,
            ..NormalizationBounds::default()
        };
        let score = combine_scores(60.0, 0.2, &bounds).unwrap();
        assert!((score.percent - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_bounds_rejected() {
        let bounds = NormalizationBounds {
            max_perplexity: 0.0,
            ..NormalizationBounds::default()
        };
        assert!(matches!(combine_scores(1.0, 0.5, &bounds), Err(DetectionError::InvalidConfig(_))));

        let bounds = NormalizationBounds {
            max_burstiness: f64::NAN,
            ..NormalizationBounds::default()
        };
        assert!(matches!(validate_bounds(&bounds), Err(DetectionError::InvalidConfig(_))));
    }
}
