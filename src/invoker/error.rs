// TOTP Warden — Invoker error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("Caller is not authorized to request enrollment")]
    Unauthorized,

    #[error("Generator executable not available: {}", .0.display())]
    ExecutableUnavailable(PathBuf),

    #[error("Failed to create isolated child process: {0}")]
    ProcessCreation(String),

    #[error("Secret generation failed: {0}")]
    GenerationFailed(String),
}
