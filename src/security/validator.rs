use std::collections::HashSet;
use thiserror::Error;
use crate::config::policy::Policy;
use crate::security::path::Operation;
use crate::security::MUTATING_GIT_SUBCOMMANDS;

/// Denials produced by path and git command validation
///
/// Messages name the role and the caller-visible path or subcommand. They
/// never include the canonical repository root.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Access denied: path '{path}' requested by role '{role}' escapes repository root")]
    PathEscape { role: String, path: String },

    #[error("Access denied: path '{path}' is in the never_touch list for role '{role}'")]
    NeverTouch { role: String, path: String },

    #[error("Access denied: role '{role}' has no {operation} permission for '{path}'")]
    PermissionDenied {
        role: String,
        operation: Operation,
        path: String,
    },

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Role '{role}' sent an empty git command")]
    EmptyGitCommand { role: String },

    #[error("Git subcommand '{subcommand}' is not allowed for role '{role}'")]
    GitDisallowed { role: String, subcommand: String },

    #[error("Role '{role}' may only use 'git checkout -b <branch>'")]
    CheckoutRequiresNewBranch { role: String },

    #[error("Role '{role}' is read-only and cannot execute state-changing git command '{subcommand}'")]
    GitRoleDenied { role: String, subcommand: String },
}

impl SecurityError {
    /// Short, stable reason string for the denial
    pub fn reason(&self) -> &'static str {
        match self {
            SecurityError::PathEscape { .. } => "escapes repository root",
            SecurityError::NeverTouch { .. } => "never_touch",
            SecurityError::PermissionDenied {
                operation: Operation::Read,
                ..
            } => "no read permission",
            SecurityError::PermissionDenied {
                operation: Operation::Write,
                ..
            } => "no write permission",
            SecurityError::UnknownRole(_) => "unknown role",
            SecurityError::EmptyGitCommand { .. } => "empty git command",
            SecurityError::GitDisallowed { .. } => "git subcommand not allowed",
            SecurityError::CheckoutRequiresNewBranch { .. } => "checkout requires -b",
            SecurityError::GitRoleDenied { .. } => "role cannot mutate repository",
        }
    }
}

/// Validates git argument vectors against the allowlist and role rules
///
/// Only the subcommand and the role are checked. Roles missing from the
/// policy are refused before anything else. Paths passed as later
/// arguments (e.g. `git add <path>`) are not run through the path policy.
#[derive(Debug, Clone)]
pub struct GitCommandValidator {
    allowed_subcommands: HashSet<String>,
    known_roles: HashSet<String>,
    mutating_role: String,
}

impl GitCommandValidator {
    pub fn new<A, R, S>(allowlist: A, roles: R, mutating_role: impl Into<String>) -> Self
    where
        A: IntoIterator<Item = S>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_subcommands: allowlist.into_iter().map(Into::into).collect(),
            known_roles: roles.into_iter().map(Into::into).collect(),
            mutating_role: mutating_role.into(),
        }
    }

    /// Build a validator from the policy's allowlist and role names
    pub fn from_policy(policy: &Policy, mutating_role: impl Into<String>) -> Self {
        Self::new(
            policy.git_allowlist().iter().map(String::as_str),
            policy.role_names(),
            mutating_role,
        )
    }

    /// Validate a git command given as arguments without the leading `git`
    pub fn validate(&self, args: &[String], role: &str) -> Result<(), SecurityError> {
        if !self.known_roles.contains(role) {
            return Err(SecurityError::UnknownRole(role.to_string()));
        }

        let Some(subcommand) = args.first() else {
            return Err(SecurityError::EmptyGitCommand {
                role: role.to_string(),
            });
        };

        if !self.check_subcommand(subcommand) {
            return Err(SecurityError::GitDisallowed {
                role: role.to_string(),
                subcommand: subcommand.clone(),
            });
        }

        // Branch creation only; switching to an existing branch is never allowed
        if subcommand == "checkout" && args.get(1).map(String::as_str) != Some("-b") {
            return Err(SecurityError::CheckoutRequiresNewBranch {
                role: role.to_string(),
            });
        }

        if Self::is_mutating(subcommand) && role != self.mutating_role {
            return Err(SecurityError::GitRoleDenied {
                role: role.to_string(),
                subcommand: subcommand.clone(),
            });
        }

        Ok(())
    }

    /// Check if subcommand is in allowlist
    fn check_subcommand(&self, subcommand: &str) -> bool {
        self.allowed_subcommands.contains(subcommand)
    }

    pub fn is_mutating(subcommand: &str) -> bool {
        MUTATING_GIT_SUBCOMMANDS.contains(&subcommand)
    }

    pub fn mutating_role(&self) -> &str {
        &self.mutating_role
    }
}
