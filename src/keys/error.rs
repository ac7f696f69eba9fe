// TOTP Warden — Key store error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Master key file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Master key file too short: {0} bytes, expected {1}")]
    ShortKey(usize, usize),

    #[error("Failed to read master key: {0}")]
    Io(#[from] std::io::Error),
}
