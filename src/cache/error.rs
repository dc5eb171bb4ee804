//! Cache store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted entry: {0}")]
    Corrupted(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
