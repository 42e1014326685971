use thiserror::Error;

/// Errors raised while loading or validating a model artifact.
///
/// All of these are fatal: an artifact that fails validation never reaches
/// the classifier.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Feature schema mismatch: {0}")]
    FeatureSchemaMismatch(String),

    #[error("Invalid model artifact: {0}")]
    Invalid(String),

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while classifying a candidate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Feature schema mismatch: scorer expects {expected} features, got {got}")]
    FeatureSchemaMismatch { expected: usize, got: usize },
}

/// Errors raised by the part-of-speech tagger.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("No taggable tokens in {0:?}")]
    NoTokens(String),
}
