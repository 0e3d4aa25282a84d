use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::settings::ConfigError;
use crate::security::pattern::PatternSet;
use crate::security::validator::SecurityError;

/// Path permissions for one role
#[derive(Debug, Clone)]
pub struct Role {
    pub name: String,
    pub read_only: PatternSet,
    pub read_write: PatternSet,
    pub never_touch: PatternSet,
}

/// Role permissions plus the git allowlist, loaded once and never mutated
#[derive(Debug, Clone)]
pub struct Policy {
    roles: BTreeMap<String, Role>,
    git_allowlist: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPolicy {
    roles: Option<BTreeMap<String, RawRole>>,
    git_allowlist: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawRole {
    read_only: Option<Vec<String>>,
    read_write: Option<Vec<String>>,
    never_touch: Option<Vec<String>>,
}

impl Policy {
    /// Load a policy from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawPolicy = serde_json::from_str(contents)?;
        Self::from_raw(raw)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let raw: RawPolicy = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawPolicy) -> Result<Self, ConfigError> {
        let raw_roles = raw.roles.ok_or(ConfigError::MissingKey("roles"))?;
        let git_allowlist = raw
            .git_allowlist
            .ok_or(ConfigError::MissingKey("git_allowlist"))?;

        let mut roles = BTreeMap::new();
        for (name, raw_role) in raw_roles {
            if raw_role.read_only.is_none()
                && raw_role.read_write.is_none()
                && raw_role.never_touch.is_none()
            {
                return Err(ConfigError::InvalidValue(format!(
                    "role '{}' defines none of read_only, read_write, never_touch",
                    name
                )));
            }

            let role = Role {
                name: name.clone(),
                read_only: compile_list(raw_role.read_only)?,
                read_write: compile_list(raw_role.read_write)?,
                never_touch: compile_list(raw_role.never_touch)?,
            };
            roles.insert(name, role);
        }

        Ok(Self {
            roles,
            git_allowlist,
        })
    }

    /// Look up a role; unknown names fail closed
    pub fn role(&self, name: &str) -> Result<&Role, SecurityError> {
        self.roles
            .get(name)
            .ok_or_else(|| SecurityError::UnknownRole(name.to_string()))
    }

    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn git_allowlist(&self) -> &[String] {
        &self.git_allowlist
    }

    pub fn is_git_allowed(&self, subcommand: &str) -> bool {
        self.git_allowlist.iter().any(|s| s == subcommand)
    }
}

fn compile_list(raw: Option<Vec<String>>) -> Result<PatternSet, ConfigError> {
    PatternSet::compile(&raw.unwrap_or_default())
        .map_err(|(pattern, source)| ConfigError::InvalidPattern { pattern, source })
}
