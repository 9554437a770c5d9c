// Language Model Oracle
// Scoring oracle used for perplexity: the trait seam plus a file-backed bigram model

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

pub const UNK_TOKEN: &str = "<unk>";
pub const UNK_ID: u32 = 0;
const DEFAULT_MAX_SEQUENCE_LEN: usize = 1024;
const DEFAULT_SMOOTHING: f64 = 1.0;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("No language model configured")]
    MissingModel,
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// A pretrained language model treated as a black-box scorer.
///
/// `next_token_logits` returns one row per input position; row `i` is the
/// unnormalized log-distribution over the vocabulary for the token at `i + 1`.
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    fn max_sequence_len(&self) -> usize;

    fn encode(&self, text: &str) -> Result<Vec<u32>, OracleError>;

    fn next_token_logits(&self, ids: &[u32]) -> Result<Vec<Vec<f32>>, OracleError>;
}

/// On-disk representation of a bigram model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BigramModelFile {
    pub name: String,
    #[serde(default = "default_max_sequence_len")]
    pub max_sequence_len: usize,
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    pub vocab: Vec<String>,
    /// (previous id, next id, count)
    #[serde(default)]
    pub bigrams: Vec<(u32, u32, u64)>,
}

fn default_max_sequence_len() -> usize { DEFAULT_MAX_SEQUENCE_LEN }
fn default_smoothing() -> f64 { DEFAULT_SMOOTHING }

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}_']+|[^\s\p{L}\p{N}_']").expect("token regex"))
}

/// Split text into the lowercase surface tokens the bigram model is keyed on.
pub fn tokenize_for_model(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_re()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Bigram model with additive smoothing:
/// P(w | prev) = (c(prev, w) + k) / (c(prev) + k * |V|)
#[derive(Debug, Clone)]
pub struct BigramLanguageModel {
    name: String,
    max_sequence_len: usize,
    smoothing: f64,
    vocab: Vec<String>,
    index: HashMap<String, u32>,
    transitions: HashMap<u32, HashMap<u32, u64>>,
    context_totals: HashMap<u32, u64>,
}

impl BigramLanguageModel {
    /// Load a model from a JSON file. Called once at startup.
    pub fn from_file(path: &Path) -> Result<Self, OracleError> {
        let content = fs::read_to_string(path).map_err(|source| OracleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json_str(&content)?;
        info!(
            "[LANGUAGE_MODEL] loaded model={} vocab={} path={}",
            model.name,
            model.vocab.len(),
            path.display()
        );
        Ok(model)
    }

    pub fn from_json_str(content: &str) -> Result<Self, OracleError> {
        let file: BigramModelFile = serde_json::from_str(content)?;
        Self::from_model_file(file)
    }

    pub fn from_model_file(file: BigramModelFile) -> Result<Self, OracleError> {
        if file.vocab.is_empty() {
            return Err(OracleError::InvalidModel("vocabulary is empty".to_string()));
        }
        if file.vocab[0] != UNK_TOKEN {
            return Err(OracleError::InvalidModel(format!(
                "vocab[0] must be {}, found {:?}",
                UNK_TOKEN, file.vocab[0]
            )));
        }
        if !(file.smoothing.is_finite() && file.smoothing > 0.0) {
            return Err(OracleError::InvalidModel(format!(
                "smoothing must be positive, got {}",
                file.smoothing
            )));
        }
        if file.max_sequence_len == 0 {
            return Err(OracleError::InvalidModel("maxSequenceLen must be at least 1".to_string()));
        }

        let mut index = HashMap::with_capacity(file.vocab.len());
        for (id, token) in file.vocab.iter().enumerate() {
            if index.insert(token.clone(), id as u32).is_some() {
                return Err(OracleError::InvalidModel(format!("duplicate vocab entry {:?}", token)));
            }
        }

        let vocab_len = file.vocab.len() as u32;
        let mut transitions: HashMap<u32, HashMap<u32, u64>> = HashMap::new();
        let mut context_totals: HashMap<u32, u64> = HashMap::new();
        for &(prev, next, count) in &file.bigrams {
            if prev >= vocab_len || next >= vocab_len {
                return Err(OracleError::InvalidModel(format!(
                    "bigram ({}, {}) out of vocab range {}",
                    prev, next, vocab_len
                )));
            }
            let overflow = || OracleError::InvalidModel("bigram counts overflow".to_string());
            let pair = transitions.entry(prev).or_default().entry(next).or_insert(0);
            *pair = pair.checked_add(count).ok_or_else(overflow)?;
            let total = context_totals.entry(prev).or_insert(0);
            *total = total.checked_add(count).ok_or_else(overflow)?;
        }

        Ok(Self {
            name: file.name,
            max_sequence_len: file.max_sequence_len,
            smoothing: file.smoothing,
            vocab: file.vocab,
            index,
            transitions,
            context_totals,
        })
    }

    #[cfg(test)]
    pub fn vocab_len(&self) -> usize {
        self.vocab.len()
    }

    pub fn token_id(&self, token: &str) -> u32 {
        self.index.get(token).copied().unwrap_or(UNK_ID)
    }

    fn logits_row(&self, prev: u32) -> Vec<f32> {
        let v = self.vocab.len() as f64;
        let k = self.smoothing;
        let total = self.context_totals.get(&prev).copied().unwrap_or(0) as f64;
        let denom = total + k * v;
        let counts = self.transitions.get(&prev);

        (0..self.vocab.len() as u32)
            .map(|next| {
                let c = counts.and_then(|m| m.get(&next)).copied().unwrap_or(0) as f64;
                ((c + k) / denom).ln() as f32
            })
            .collect()
    }
}

impl LanguageModel for BigramLanguageModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_sequence_len(&self) -> usize {
        self.max_sequence_len
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, OracleError> {
        Ok(tokenize_for_model(text)
            .iter()
            .map(|t| self.token_id(t))
            .collect())
    }

    fn next_token_logits(&self, ids: &[u32]) -> Result<Vec<Vec<f32>>, OracleError> {
        let vocab_len = self.vocab.len() as u32;
        ids.iter()
            .map(|&id| {
                if id >= vocab_len {
                    return Err(OracleError::Inference(format!(
                        "token id {} outside vocabulary of {}",
                        id, vocab_len
                    )));
                }
                Ok(self.logits_row(id))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_model() -> BigramLanguageModel {
        BigramLanguageModel::from_model_file(BigramModelFile {
            name: "tiny".to_string(),
            max_sequence_len: 16,
            smoothing: 1.0,
            vocab: vec![UNK_TOKEN.to_string(), "the".to_string(), "cat".to_string(), ".".to_string()],
            bigrams: vec![(1, 2, 6), (2, 3, 2)],
        })
        .unwrap()
    }

    #[test]
    fn test_tokenize_for_model() {
        let tokens = tokenize_for_model("The cat's hat, isn't it?");
        assert_eq!(tokens, vec!["the", "cat's", "hat", ",", "isn't", "it", "?"]);
    }

    #[test]
    fn test_encode_maps_unknown_words() {
        let model = tiny_model();
        let ids = model.encode("The dog.").unwrap();
        assert_eq!(ids, vec![1, UNK_ID, 3]);
    }

    #[test]
    fn test_logits_are_normalized_log_probs() {
        let model = tiny_model();
        let rows = model.next_token_logits(&[1]).unwrap();
        assert_eq!(rows.len(), 1);
        let total: f64 = rows[0].iter().map(|&l| (l as f64).exp()).sum();
        assert!((total - 1.0).abs() < 1e-5);
        // (6 + 1) / (6 + 4)
        assert!(((rows[0][2] as f64).exp() - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_unseen_context_is_uniform() {
        let model = tiny_model();
        let rows = model.next_token_logits(&[3]).unwrap();
        for l in &rows[0] {
            assert!(((*l as f64).exp() - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_out_of_range_id_fails() {
        let model = tiny_model();
        assert!(matches!(model.next_token_logits(&[9]), Err(OracleError::Inference(_))));
    }

    #[test]
    fn test_invalid_model_files() {
        let no_unk = r#"{"name":"x","vocab":["a","b"]}"#;
        assert!(matches!(BigramLanguageModel::from_json_str(no_unk), Err(OracleError::InvalidModel(_))));

        let bad_range = r#"{"name":"x","vocab":["<unk>","a"],"bigrams":[[0,5,1]]}"#;
        assert!(matches!(BigramLanguageModel::from_json_str(bad_range), Err(OracleError::InvalidModel(_))));

        let bad_smoothing = r#"{"name":"x","vocab":["<unk>"],"smoothing":0.0}"#;
        assert!(matches!(BigramLanguageModel::from_json_str(bad_smoothing), Err(OracleError::InvalidModel(_))));

        assert!(matches!(BigramLanguageModel::from_json_str("not json"), Err(OracleError::JsonError(_))));
    }

    #[test]
    fn test_overflowing_counts_rejected() {
        let json = format!(
            r#"{{"name":"x","vocab":["<unk>","a","b"],"bigrams":[[1,1,{max}],[1,2,{max}]]}}"#,
            max = u64::MAX
        );
        match BigramLanguageModel::from_json_str(&json) {
            Err(OracleError::InvalidModel(msg)) => assert_eq!(msg, "bigram counts overflow"),
            other => panic!("expected InvalidModel, got {:?}", other.map(|m| m.vocab_len())),
        }

        let repeated_pair = format!(
            r#"{{"name":"x","vocab":["<unk>","a"],"bigrams":[[1,1,{max}],[1,1,1]]}}"#,
            max = u64::MAX
        );
        assert!(matches!(
            BigramLanguageModel::from_json_str(&repeated_pair),
            Err(OracleError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_defaults_from_json() {
        let model = BigramLanguageModel::from_json_str(r#"{"name":"x","vocab":["<unk>","a"]}"#).unwrap();
        assert_eq!(model.max_sequence_len(), 1024);
        assert_eq!(model.vocab_len(), 2);
    }

    #[test]
    fn test_bundled_sample_model_loads() {
        let model = BigramLanguageModel::from_json_str(include_str!("../../assets/sample-bigram.json")).unwrap();
        assert_eq!(model.name(), "sample-bigram");
        assert_ne!(model.token_id("fox"), UNK_ID);

        let seen = model.encode("The quick brown fox jumps over the lazy dog.").unwrap();
        assert!(seen.iter().all(|&id| id != UNK_ID));
        let rows = model.next_token_logits(&seen).unwrap();
        assert_eq!(rows.len(), seen.len());
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join(format!("gpt-shield-missing-{}.json", uuid::Uuid::new_v4()));
        assert!(matches!(BigramLanguageModel::from_file(&path), Err(OracleError::Io { .. })));
    }
}
