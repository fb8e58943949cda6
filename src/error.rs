//! Error types.
//!
//! Registry failures are soft: every operation returns a `Result` and logs
//! a diagnostic, nothing panics. Callers decide whether a miss matters.

use thiserror::Error;

/// Why a registry operation did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The component kind was never registered.
    #[error("component kind `{kind}` does not exist")]
    UnknownKind { kind: String },

    /// The kind exists but holds no instance under this id.
    #[error("instance `{id}` of kind `{kind}` does not exist")]
    UnknownInstance { kind: String, id: String },

    /// An instance already occupies this id and override was not requested.
    #[error("instance `{id}` of kind `{kind}` already exists")]
    Duplicate { kind: String, id: String },

    /// `register` was called twice for the same kind.
    #[error("component kind `{kind}` is already registered")]
    KindExists { kind: String },

    /// No free id could be generated for an id-less `add`.
    #[error("no free id of length {length} for kind `{kind}`")]
    IdsExhausted { kind: String, length: usize },
}

impl RegistryError {
    /// Container-level failures (the kind itself) as opposed to leaf misses.
    pub fn is_kind_level(&self) -> bool {
        matches!(self, RegistryError::UnknownKind { .. } | RegistryError::KindExists { .. })
    }
}

/// A selector string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected character `{found}` at offset {offset} in `{selector}`")]
    Unexpected { selector: String, found: char, offset: usize },

    #[error("unterminated attribute selector in `{selector}`")]
    UnterminatedAttribute { selector: String },

    #[error("combinators are not supported: `{selector}`")]
    Combinator { selector: String },
}

/// Configuration that could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid SPARK_KIT_ENV `{0}` (expected `development` or `production`)")]
    Environment(String),

    #[error("invalid SPARK_KIT_ID_LENGTH `{0}`")]
    IdLength(String),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
