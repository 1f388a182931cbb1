use thiserror::Error;

/// Main error type for proxy operations
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid address {0:?} (expected HOST:PORT)")]
    Address(String),
}

/// Convenience Result type
pub type Result<T> = std::result::Result<T, ProxyError>;
