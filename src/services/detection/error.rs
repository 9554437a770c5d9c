// Detection errors
// Every failure is local to one analysis call

use crate::services::language_model::OracleError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Language model unavailable: {0}")]
    OracleUnavailable(String),
    #[error("Input is too long: {len} tokens exceeds the model limit of {max}")]
    SequenceTooLong { len: usize, max: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<OracleError> for DetectionError {
    fn from(e: OracleError) -> Self {
        DetectionError::OracleUnavailable(e.to_string())
    }
}

impl Serialize for DetectionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
