// ============================================================================
// Transcoding Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TranscodingError {
    /// No transcoding rule exists for the value.
    #[error("Unable to encode value of type {type_name}: {reason}")]
    Encode { type_name: String, reason: String },

    /// Input text is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Topic does not resolve to a registered type.
    #[error("Unable to resolve topic {topic:?}: {reason}")]
    Resolution { topic: String, reason: String },

    /// A reserved wrapper carries a payload that cannot be rebuilt.
    #[error("Malformed {key} value: {reason}")]
    MalformedValue { key: &'static str, reason: String },

    #[error("Expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("State of {topic} is missing field `{field}`")]
    MissingField { topic: String, field: String },
}

impl TranscodingError {
    pub(crate) fn encode(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn resolution(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(key: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::MalformedValue {
            key,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
