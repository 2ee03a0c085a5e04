//! Policy error types.

use thiserror::Error;

/// Policy errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The operation needs an authenticated principal.
    #[error("session not authenticated")]
    NotAuthenticated,

    /// The caller lacks a right the operation requires.
    #[error("right required: {0}")]
    Unauthorized(String),

    /// A token subject did not describe a principal.
    #[error("invalid principal claims: {0}")]
    InvalidClaims(String),

    /// Failed to parse a principal table.
    #[error("failed to parse principals: {0}")]
    Parse(String),

    /// An I/O error occurred while reading a principal table.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
