use std::io;
use thiserror::Error;

/// Central error type for the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Underlying I/O error from the OS or network.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The configured listen address could not be parsed.
    #[error("invalid listen address: {0}")]
    Addr(String),
}

pub type ServerResult<T> = Result<T, ServerError>;
