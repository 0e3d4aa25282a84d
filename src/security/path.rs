use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::policy::Policy;
use crate::security::validator::SecurityError;

/// The kind of access requested for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Write => write!(f, "write"),
        }
    }
}

/// Outcome of evaluating one path for one role and operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDecision {
    pub absolute_path: PathBuf,
    /// POSIX-style path relative to the repository root (`.` for the root)
    pub relative_path: String,
    pub allowed: bool,
    pub reason: Option<String>,
}

/// Resolves caller paths inside a fixed repository root and applies role policy
#[derive(Debug, Clone)]
pub struct PathValidator {
    repo_root: PathBuf,
    policy: Policy,
}

impl PathValidator {
    /// Create a validator; the root is canonicalized once here
    pub fn new<P: AsRef<Path>>(repo_root: P, policy: Policy) -> io::Result<Self> {
        let repo_root = fs::canonicalize(repo_root.as_ref())?;
        if !repo_root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "repository root is not a directory",
            ));
        }

        Ok(Self { repo_root, policy })
    }

    /// Validate `requested` for `role` and return the resolved location
    ///
    /// Resolution and containment run before any policy check. The returned
    /// decision always has `allowed == true`; denials come back as errors.
    pub fn validate_path(
        &self,
        requested: &str,
        role: &str,
        operation: Operation,
    ) -> Result<PathDecision, SecurityError> {
        let role_policy = self.policy.role(role)?;

        let escape = || SecurityError::PathEscape {
            role: role.to_string(),
            path: requested.to_string(),
        };
        let absolute_path = self.resolve(requested).ok_or_else(escape)?;
        let relative_path = self.relative_posix(&absolute_path).ok_or_else(escape)?;

        // Blacklist wins over every grant, for every operation
        if role_policy.never_touch.matches(&relative_path) {
            return Err(SecurityError::NeverTouch {
                role: role.to_string(),
                path: relative_path,
            });
        }

        let allowed = match operation {
            Operation::Write => role_policy.read_write.matches(&relative_path),
            Operation::Read => {
                role_policy.read_write.matches(&relative_path)
                    || role_policy.read_only.matches(&relative_path)
            }
        };

        if !allowed {
            return Err(SecurityError::PermissionDenied {
                role: role.to_string(),
                operation,
                path: relative_path,
            });
        }

        Ok(PathDecision {
            absolute_path,
            relative_path,
            allowed: true,
            reason: None,
        })
    }

    /// Like `validate_path`, but folds denials into the decision
    pub fn decide(&self, requested: &str, role: &str, operation: Operation) -> PathDecision {
        match self.validate_path(requested, role, operation) {
            Ok(decision) => decision,
            Err(err) => PathDecision {
                absolute_path: PathBuf::new(),
                relative_path: requested.to_string(),
                allowed: false,
                reason: Some(err.reason().to_string()),
            },
        }
    }

    /// Resolve `requested` against the canonical root one component at a time
    ///
    /// Existing symlinks are followed. Names that don't exist yet are appended
    /// as-is. Leaving the root at any step is an escape, so `../x` is rejected
    /// without touching the filesystem and absolute inputs are never accepted.
    /// `None` means the path escapes.
    fn resolve(&self, requested: &str) -> Option<PathBuf> {
        let mut current = self.repo_root.clone();

        for component in Path::new(requested).components() {
            match component {
                Component::Prefix(_) | Component::RootDir => return None,
                Component::CurDir => {}
                Component::ParentDir => {
                    current.pop();
                }
                Component::Normal(name) => {
                    let candidate = current.join(name);
                    current = match fs::symlink_metadata(&candidate) {
                        // A dangling link can't be proven to stay inside the root
                        Ok(meta) if meta.file_type().is_symlink() => {
                            fs::canonicalize(&candidate).ok()?
                        }
                        _ => candidate,
                    };
                }
            }

            if !current.starts_with(&self.repo_root) {
                return None;
            }
        }

        Some(current)
    }

    fn relative_posix(&self, absolute: &Path) -> Option<String> {
        let rel = absolute.strip_prefix(&self.repo_root).ok()?;

        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        if parts.is_empty() {
            Some(".".to_string())
        } else {
            Some(parts.join("/"))
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }
}
