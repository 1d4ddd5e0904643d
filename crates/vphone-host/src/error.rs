//! Host-action errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    #[error("injection failed: {0}")]
    Injection(String),

    #[error("unknown package: {0}")]
    UnknownPackage(String),

    #[error("media transport error: {0}")]
    Media(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
