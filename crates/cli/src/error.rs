//! CLI error types.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The stored record file does not exist.
    #[error("record not found at {path}")]
    RecordNotFound { path: PathBuf },

    /// The request was refused; the response body has already been written.
    #[error("request failed with status {status}")]
    Status { status: u16 },

    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the codec.
    #[error(transparent)]
    Codec(#[from] codec::Error),

    /// An error occurred in the policy layer.
    #[error(transparent)]
    Policy(#[from] policy::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Status { status } if *status < 500 => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
