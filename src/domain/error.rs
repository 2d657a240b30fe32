use thiserror::Error;

/// Failures of an embedding lookup. These are always fatal for a
/// pipeline run; the converter wraps them with sequence context.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("word '{word}' is not in the embedding vocabulary")]
    OutOfVocabulary { word: String },

    #[error("no character n-gram of '{word}' was seen during training")]
    NoKnownSubwords { word: String },

    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}
