//! Codec errors and their mapping onto responses.

use policy::Capabilities;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Right that lets a caller see the detailed text of an error.
pub const SEE_ERRORS_RIGHT: &str = "seeErrors";

/// Message shown to callers who may not see error details.
pub const DEFAULT_ERROR_TEXT: &str = "An error has occurred. Please try the app again later.";

/// Codec errors.
///
/// Authorization failures are never errors: a field the caller may not read
/// is omitted and a field it may not write is left alone.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The body could not be decoded into the target type. Covers syntax
    /// errors, wrong structural shape, and failures reported by a leaf
    /// type's own `Deserialize` impl.
    #[error("malformed body: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A record was required where the value has another shape.
    #[error("expected a record: {context}")]
    NotRecord { context: String },

    /// A leaf type's own `Serialize` impl failed.
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The HTTP status a transport layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            Error::Malformed(_) => 400,
            Error::NotRecord { .. } | Error::Encode(_) => 500,
        }
    }

    /// True when the request, not the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}

/// The JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(skip)]
    pub status: u16,
    pub message: String,
}

impl ErrorMessage {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Build the response for `error` as seen by the caller.
    ///
    /// Only callers holding [`SEE_ERRORS_RIGHT`] get the error's own text;
    /// everyone else gets [`DEFAULT_ERROR_TEXT`].
    pub fn for_caller(error: &Error, capabilities: &Capabilities) -> Self {
        Self::with_friendly(error, DEFAULT_ERROR_TEXT, capabilities)
    }

    /// Like [`ErrorMessage::for_caller`] with a custom fallback text.
    pub fn with_friendly(error: &Error, friendly: &str, capabilities: &Capabilities) -> Self {
        let message = if capabilities.has_right(SEE_ERRORS_RIGHT) {
            error.to_string()
        } else {
            friendly.to_string()
        };
        Self::new(error.status(), message)
    }
}
