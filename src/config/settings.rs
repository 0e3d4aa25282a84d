use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::security::DEFAULT_MUTATING_ROLE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to parse policy: {0}")]
    PolicyParseError(#[from] serde_json::Error),

    #[error("Policy is missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Everything the gateway needs, fixed at construction
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GatewayConfig {
    pub repo_root: PathBuf,
    pub policy_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log_path: Option<PathBuf>,
    #[serde(default = "default_git_timeout_seconds")]
    pub git_timeout_seconds: u64,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_mutating_role")]
    pub mutating_role: String,
    /// When set, every tool call runs as this role regardless of its arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_role: Option<String>,
}

fn default_git_timeout_seconds() -> u64 {
    30
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_mutating_role() -> String {
    DEFAULT_MUTATING_ROLE.to_string()
}

impl GatewayConfig {
    /// Configuration with default limits for the given root and policy file
    pub fn new<R: Into<PathBuf>, P: Into<PathBuf>>(repo_root: R, policy_path: P) -> Self {
        Self {
            repo_root: repo_root.into(),
            policy_path: policy_path.into(),
            audit_log_path: None,
            git_timeout_seconds: default_git_timeout_seconds(),
            max_file_bytes: default_max_file_bytes(),
            mutating_role: default_mutating_role(),
            session_role: None,
        }
    }

    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: GatewayConfig = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    pub fn with_audit_log<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.audit_log_path = Some(path.into());
        self
    }

    pub fn with_session_role(mut self, role: impl Into<String>) -> Self {
        self.session_role = Some(role.into());
        self
    }

    /// Audit log location: explicit path, else `artifacts/logs/repo_tools.jsonl` under the root
    pub fn audit_log_path(&self) -> PathBuf {
        self.audit_log_path.clone().unwrap_or_else(|| {
            self.repo_root
                .join("artifacts")
                .join("logs")
                .join("repo_tools.jsonl")
        })
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_seconds)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.git_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "git_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.max_file_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "max_file_bytes must be greater than 0".to_string(),
            ));
        }

        if self.mutating_role.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "mutating_role must not be empty".to_string(),
            ));
        }

        if let Some(role) = &self.session_role {
            if role.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "session_role must not be empty when set".to_string(),
                ));
            }
        }

        Ok(())
    }
}
