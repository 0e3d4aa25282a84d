pub mod audit;
pub mod config;
pub mod error;
pub mod gateway;
pub mod git;
pub mod security;

// Re-export commonly used types for convenience
pub use config::{GatewayConfig, Policy};
pub use error::{AppError, AppResult, GitError};
pub use gateway::ToolGateway;
pub use security::{Operation, SecurityError};
