use std::io;
use thiserror::Error;

// Import module-level errors for AppError
use crate::config::settings::ConfigError;
use crate::gateway::tools::ToolError;
use crate::security::validator::SecurityError;

/// Errors that can occur while running a git subprocess
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to execute git: {0}")]
    SpawnFailed(String),

    #[error("Git command timed out after {0} seconds")]
    Timeout(u64),

    #[error("Failed to read git output: {0}")]
    OutputUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Top-level application error that wraps all module-specific errors
///
/// Only startup and transport failures reach this type. Per-request failures
/// stay inside the gateway as `ToolError` and are answered on the wire.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Security validation error: {0}")]
    Security(#[from] SecurityError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
