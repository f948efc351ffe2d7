//! Error types for image editing runs.

use std::path::PathBuf;

/// Longest API error message kept before truncation.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while editing an image.
#[derive(Debug, thiserror::Error)]
pub enum GenEditError {
    /// Required configuration (the API key) is missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// The input image does not exist.
    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The input image exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The output image could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// API key rejected by the service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Prompt or output was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Network or HTTP transport error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inline data was not valid base64.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// The response was well-formed but carried no inline image.
    #[error("no image returned{}", describe_references(.file_references))]
    NoImageReturned {
        /// Remote file references the service returned instead, if any.
        file_references: Vec<String>,
    },
}

fn describe_references(refs: &[String]) -> String {
    if refs.is_empty() {
        String::new()
    } else {
        format!(" (file references: {})", refs.join(", "))
    }
}

impl GenEditError {
    /// Builds the read-side error for `path`, separating a missing file from
    /// other failures.
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::Read { path, source }
        }
    }

    /// Returns true for failures that happened on the local filesystem.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::Read { .. } | Self::Write { .. }
        )
    }

    /// Returns true for failures reported by, or on the way to, the service.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Auth(_)
                | Self::Api { .. }
                | Self::ContentBlocked(_)
                | Self::Json(_)
        )
    }
}

/// Result type alias for image editing operations.
pub type Result<T> = std::result::Result<T, GenEditError>;

/// Strips secrets from a service error body and bounds its length.
///
/// Google echoes the request URL in some errors, which may carry `key=...`.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let mut out = String::with_capacity(text.len().min(MAX_ERROR_MESSAGE_LEN));
    let mut rest = text;
    while let Some(idx) = rest.find("key=") {
        out.push_str(&rest[..idx + 4]);
        out.push_str("[REDACTED]");
        rest = &rest[idx + 4..];
        let end = rest
            .find(|c: char| c == '&' || c == '"' || c.is_whitespace())
            .unwrap_or(rest.len());
        rest = &rest[end..];
    }
    out.push_str(rest);

    let trimmed = out.trim();
    if trimmed.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let cut: String = trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}
