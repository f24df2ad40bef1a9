//! Error types for the index query codec

use thiserror::Error;

/// Main error type for query encoding, decoding, and configuration
#[derive(Error, Debug)]
pub enum Error {
    /// Encode was requested without a query
    #[error("query is nil")]
    NilQuery,

    /// Wire bytes do not parse as a query message
    ///
    /// Indicates transport corruption or a version mismatch between the
    /// coordinator and the storage node.
    #[error("Malformed query message: {0}")]
    MalformedMessage(String),

    /// A regexp node's pattern failed validation or compilation
    #[error("Invalid regexp pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern (truncated for display)
        pattern: String,
        /// Why the pattern was rejected
        reason: String,
    },

    /// The query tree nests deeper than the codec accepts
    #[error("Query depth {depth} exceeds maximum of {max_depth}")]
    QueryTooDeep {
        /// Depth of the rejected tree (or the level where decoding stopped)
        depth: usize,
        /// Maximum depth in effect
        max_depth: usize,
    },

    /// The wire message carries a query variant this version does not know
    #[error("Unknown query variant: {0}")]
    UnknownQueryVariant(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Build an `InvalidPattern` error, truncating long patterns so error
    /// messages stay bounded
    pub fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        let pattern = if pattern.chars().count() > 50 {
            let head: String = pattern.chars().take(50).collect();
            format!("{}...", head)
        } else {
            pattern.to_string()
        };
        Error::InvalidPattern {
            pattern,
            reason: reason.into(),
        }
    }
}

impl From<prost::DecodeError> for Error {
    fn from(e: prost::DecodeError) -> Self {
        Error::MalformedMessage(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::NilQuery.to_string(), "query is nil");

        let err = Error::UnknownQueryVariant("unset oneof".to_string());
        assert!(err.to_string().contains("unset oneof"));
    }

    #[test]
    fn test_invalid_pattern_truncates() {
        let long = "a".repeat(200);
        match Error::invalid_pattern(&long, "too long") {
            Error::InvalidPattern { pattern, reason } => {
                assert_eq!(pattern.len(), 53);
                assert!(pattern.ends_with("..."));
                assert_eq!(reason, "too long");
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_maps_to_malformed() {
        use prost::Message;

        let err: Error = crate::query::proto::Query::decode(&[0x22, 0x05, 0x0A][..])
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::MalformedMessage(_)));
    }
}
