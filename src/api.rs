// Report surface
// Front-end facing entry points; errors come back as display-ready strings

use crate::models::AnalysisReport;
use crate::services::config_store::AppConfig;
use crate::services::detection::{top_words, AnalysisDriver, DetectionError};
use crate::services::language_model::{BigramLanguageModel, LanguageModel, OracleError};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Process-wide state built once at startup. The model is shared read-only.
pub struct AppState {
    driver: AnalysisDriver,
    top_words: usize,
}

impl AppState {
    pub fn new(model: Arc<dyn LanguageModel>, config: &AppConfig) -> Result<Self, DetectionError> {
        Ok(Self {
            driver: AnalysisDriver::new(model, config.bounds)?,
            top_words: config.top_words,
        })
    }

    /// Load the bigram model named by `model_path`, the environment or the config.
    pub fn from_config(config: &AppConfig, model_path: Option<&Path>) -> Result<Self, DetectionError> {
        let path = config
            .model
            .resolve_path(model_path)
            .ok_or(OracleError::MissingModel)?;
        let model = BigramLanguageModel::from_file(&path)?;
        info!(path = %path.display(), "model.loaded");
        Self::new(Arc::new(model), config)
    }

    pub fn top_words(&self) -> usize {
        self.top_words
    }
}

/// Run the full analysis for one text submission.
pub fn analyze_text(state: &AppState, text: &str) -> Result<AnalysisReport, String> {
    let analysis = state.driver.analyze(text).map_err(|e| {
        warn!("[API] analyze_text failed: {}", e);
        e.to_string()
    })?;

    Ok(AnalysisReport {
        input: text.to_string(),
        analysis,
        top_words: top_words(text, state.top_words),
    })
}
