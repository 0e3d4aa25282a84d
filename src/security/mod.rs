pub mod path;
pub mod pattern;
pub mod validator;

pub use path::{Operation, PathDecision, PathValidator};
pub use pattern::{Pattern, PatternSet};
pub use validator::{GitCommandValidator, SecurityError};

/// Git subcommands that change repository state
///
/// Only the designated mutating role may run these, even when the policy's
/// allowlist contains them.
pub const MUTATING_GIT_SUBCOMMANDS: &[&str] = &["add", "commit", "checkout"];

/// Role allowed to run mutating git subcommands unless configured otherwise
pub const DEFAULT_MUTATING_ROLE: &str = "integrator";
