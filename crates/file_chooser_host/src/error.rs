//! Closed error taxonomy surfaced by every chooser backend.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
/// Discriminant callers branch on when an acquisition attempt fails.
pub enum ChooserErrorKind {
    /// The selection holds more files than `max_count` allows.
    InvalidCount,
    /// A file extension is outside `file_type_limits`.
    InvalidType,
    /// A file is smaller than `min_size` or larger than `max_size`.
    InvalidSize,
    /// The image compressor failed on one of the files.
    Compress,
    /// Backend-specific failure (bridge errors, surface creation, cancelled requests).
    Other,
}

impl ChooserErrorKind {
    /// Returns a stable string token for diagnostics and event payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCount => "InvalidCount",
            Self::InvalidType => "InvalidType",
            Self::InvalidSize => "InvalidSize",
            Self::Compress => "Compress",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for ChooserErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
/// Failure of one acquisition attempt.
///
/// The message is meant for people; code should match on [`ChooserError::kind`].
pub struct ChooserError {
    kind: ChooserErrorKind,
    message: String,
}

impl ChooserError {
    /// Builds an error of an explicit kind.
    pub fn new(kind: ChooserErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Selection count exceeded the configured maximum.
    pub fn invalid_count(message: impl Into<String>) -> Self {
        Self::new(ChooserErrorKind::InvalidCount, message)
    }

    /// A file type is not allowed.
    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self::new(ChooserErrorKind::InvalidType, message)
    }

    /// A file size is outside the configured bounds.
    pub fn invalid_size(message: impl Into<String>) -> Self {
        Self::new(ChooserErrorKind::InvalidSize, message)
    }

    /// The compressor collaborator failed.
    pub fn compress(message: impl Into<String>) -> Self {
        Self::new(ChooserErrorKind::Compress, message)
    }

    /// Any other backend failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ChooserErrorKind::Other, message)
    }

    /// Returns the error discriminant.
    pub const fn kind(&self) -> ChooserErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_message_with_kind_token() {
        let err = ChooserError::compress("decoder exploded");
        assert_eq!(err.to_string(), "Compress: decoder exploded");
        assert_eq!(err.kind(), ChooserErrorKind::Compress);
        assert_eq!(err.message(), "decoder exploded");
    }

    #[test]
    fn serializes_kind_and_message_for_event_payloads() {
        let value = serde_json::to_value(ChooserError::invalid_count("too many")).expect("json");
        assert_eq!(
            value,
            serde_json::json!({"kind": "InvalidCount", "message": "too many"})
        );
    }
}
