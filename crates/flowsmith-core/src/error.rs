//! Error types shared across the flowsmith crates.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid settings
    #[error("configuration error: {0}")]
    Config(String),

    /// Provider setup or transport failure, or an answer without text
    #[error("completion failed: {0}")]
    Completion(String),
}

pub type Result<T> = std::result::Result<T, Error>;
