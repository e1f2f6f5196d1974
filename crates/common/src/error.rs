//! Error types shared across Clipline crates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level error type for Clipline operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    /// Malformed timeline, mode, format, or segment parameters.
    #[error("Invalid request: {message}")]
    InputValidation { message: String },

    /// Remote image download failed. Recovered by the synthesizer.
    #[error("Remote fetch failed: {message}")]
    RemoteFetch { message: String },

    /// The media backend (ffmpeg) rejected or failed an operation.
    #[error("Render backend error: {message}")]
    Backend { message: String },

    #[error("No video segments to concatenate")]
    NoSegments,

    #[error("Publish error: {message}")]
    Publish { message: String },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ClipError.
pub type ClipResult<T> = Result<T, ClipError>;

impl ClipError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::InputValidation {
            message: msg.into(),
        }
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::RemoteFetch {
            message: msg.into(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend {
            message: msg.into(),
        }
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Whether the caller sent something unusable (as opposed to a pipeline failure).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InputValidation { .. })
    }

    /// HTTP status an HTTP layer should answer with.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}

/// Error kind reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    RenderFailed,
    SegmentFailed,
}

/// Structured error body: `{ "error": <kind>, "detail": <string> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub detail: String,
}

impl ErrorBody {
    /// Build the client-facing body. `chunked` selects `segment_failed`
    /// over `render_failed` for pipeline failures.
    pub fn from_error(err: &ClipError, chunked: bool) -> Self {
        let error = if err.is_client_error() {
            ErrorKind::InvalidRequest
        } else if chunked {
            ErrorKind::SegmentFailed
        } else {
            ErrorKind::RenderFailed
        };
        Self {
            error,
            detail: err.to_string(),
        }
    }
}
