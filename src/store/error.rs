// TOTP Warden — Store error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid account name: {0}")]
    InvalidAccountName(String),

    #[error("Failed to persist encrypted secret: {0}")]
    Io(#[from] std::io::Error),

    #[error("Secret file written but permissions could not be restricted: {}", .0.display())]
    InsecurePermissions(PathBuf),
}
