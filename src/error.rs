use std::io;

/// Unified error type for engine construction and boundary operations.
///
/// Dictionary misses and HMM "no split" outcomes are not errors; they are
/// resolved by the pass-through and single-character fallbacks.
#[derive(Debug, thiserror::Error)]
pub enum OpenccError {
    /// A required table is missing or fails the structural line check.
    #[error("failed to load dictionary table `{table}`: {reason}")]
    DictionaryLoad { table: String, reason: String },

    #[error("unknown conversion config: {0}")]
    UnknownConfig(String),

    #[error("unknown keyword extraction method: {0} (expected \"textrank\" or \"tfidf\")")]
    UnknownKeywordMethod(String),

    /// The handle failed to construct or has already been destroyed.
    #[error("engine instance is unavailable (not created or already destroyed)")]
    InstanceUnavailable,

    #[error("invalid engine configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OpenccError {
    pub(crate) fn load(table: impl Into<String>, reason: impl Into<String>) -> Self {
        OpenccError::DictionaryLoad {
            table: table.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OpenccError>;
