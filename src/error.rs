//! Error types for the window core.

use thiserror::Error;

/// Per-command window errors
///
/// None of these terminate the window or the session; callers log them and
/// carry on with the next command.
#[derive(Debug, Error)]
pub enum WindowError {
    /// Window has no backing surface, or has been destroyed
    #[error("window {wid} is in an invalid state: {reason}")]
    InvalidState { wid: u32, reason: &'static str },

    /// A metadata property could not be interpreted
    #[error("malformed metadata {key}: {reason}")]
    MalformedMetadata { key: String, reason: String },

    /// Encoding is not part of the configured lossy or lossless sets
    #[error("unknown encoding {0:?}")]
    UnknownEncoding(String),
}

impl WindowError {
    pub(crate) fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WindowError>;
