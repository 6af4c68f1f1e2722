//! Error types for noderank.
//!
//! Library crates use [`NodeRankError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all noderank operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeRankError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Connection failure, timeout, or non-success HTTP status.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The response body could not be fully read.
    #[error("read error for {url}: {message}")]
    Read { url: String, message: String },

    /// Payload is not valid JSON or does not have the expected shape.
    ///
    /// `payload` keeps the raw body for diagnostics; it is not part of the
    /// display message.
    #[error("decode error: {message}")]
    Decode { message: String, payload: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// Data validation error (bad URL, invalid worker count, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The base list could not be fetched or parsed. Fatal for the run.
    #[error("failed to acquire base list: {0}")]
    Acquisition(Box<NodeRankError>),

    /// The aggregate could not be serialized or written. Fatal for the run.
    #[error("failed to write aggregate: {0}")]
    Sink(Box<NodeRankError>),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NodeRankError>;

impl NodeRankError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a transport error for `url`.
    pub fn transport(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a body read error for `url`.
    pub fn read(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Read {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a decode error, keeping the raw payload (lossily as UTF-8).
    pub fn decode(msg: impl Into<String>, payload: &[u8]) -> Self {
        Self::Decode {
            message: msg.into(),
            payload: String::from_utf8_lossy(payload).into_owned(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Mark an error as a fatal base-list acquisition failure.
    pub fn acquisition(inner: NodeRankError) -> Self {
        Self::Acquisition(Box::new(inner))
    }

    /// Mark an error as a fatal sink failure.
    pub fn sink(inner: NodeRankError) -> Self {
        Self::Sink(Box::new(inner))
    }

    /// Raw payload attached to a decode error, if any.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Decode { payload, .. } => Some(payload),
            Self::Acquisition(inner) | Self::Sink(inner) => inner.payload(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = NodeRankError::config("missing list_url");
        assert_eq!(err.to_string(), "config error: missing list_url");

        let err = NodeRankError::transport("https://1ml.com/node/pk1/json", "HTTP 503");
        assert!(err.to_string().contains("pk1"));
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn decode_error_keeps_payload_out_of_display() {
        let err = NodeRankError::decode("expected value at line 1", b"<html>oops</html>");
        assert_eq!(err.to_string(), "decode error: expected value at line 1");
        assert_eq!(err.payload(), Some("<html>oops</html>"));
    }

    #[test]
    fn fatal_wrappers_chain_messages() {
        let err = NodeRankError::acquisition(NodeRankError::transport("https://x", "timed out"));
        assert_eq!(
            err.to_string(),
            "failed to acquire base list: transport error for https://x: timed out"
        );

        let err = NodeRankError::acquisition(NodeRankError::decode("bad", b"{"));
        assert_eq!(err.payload(), Some("{"));
    }
}
