#![allow(dead_code)]

use scopegate::{GatewayConfig, Policy, ToolGateway};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Roles modelled on the architect / integrator / quality gate split
pub const POLICY_JSON: &str = r#"{
    "roles": {
        "architect": {
            "read_only": ["**"],
            "read_write": [],
            "never_touch": [".git/**"]
        },
        "integrator": {
            "read_only": ["**"],
            "read_write": ["R-scripts/**", "docs/**", "secrets/**"],
            "never_touch": [".git/**", "secrets/**", "*.env"]
        },
        "quality_gate": {
            "read_only": ["R-scripts/**", "outputs/**"],
            "read_write": ["outputs/qc/**"],
            "never_touch": [".git/**"]
        }
    },
    "git_allowlist": ["status", "diff", "log", "add", "commit", "checkout"]
}"#;

pub const ROLES: [&str; 3] = ["architect", "integrator", "quality_gate"];

/// Helper to create a test git repository
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    // Initialize git repo
    Command::new("git")
        .args(["init"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to init git repo");

    // Configure git
    Command::new("git")
        .args(["config", "user.name", "Test User"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to set git user.name");

    Command::new("git")
        .args(["config", "user.email", "test@example.com"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to set git user.email");

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    let file_path = repo_path.join(file);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(&file_path, content).expect("Failed to write file");

    Command::new("git")
        .args(["add", file])
        .current_dir(repo_path)
        .output()
        .expect("Failed to add file");

    Command::new("git")
        .args(["commit", "-m", message])
        .current_dir(repo_path)
        .output()
        .expect("Failed to commit");
}

/// A repository with the standard layout and a gateway over it
///
/// The audit log lives outside the repository so it never shows up in
/// `git status`.
pub struct Fixture {
    pub repo: TempDir,
    pub logs: TempDir,
    pub root: PathBuf,
    pub gateway: ToolGateway,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    pub fn with_config(adjust: impl FnOnce(GatewayConfig) -> GatewayConfig) -> Self {
        let (repo, root) = create_test_repo();
        create_commit(&root, "R-scripts/00_setup.R", "library(dplyr)\n", "Initial commit");
        fs::create_dir_all(root.join("data")).unwrap();
        fs::write(root.join("data/raw.csv"), "id,age\n1,80\n").unwrap();
        fs::create_dir_all(root.join("outputs/qc")).unwrap();

        let logs = TempDir::new().unwrap();
        let config = GatewayConfig::new(&root, root.join("configs/tool_scopes.json"))
            .with_audit_log(logs.path().join("repo_tools.jsonl"));
        let policy = Policy::from_json(POLICY_JSON).unwrap();
        let gateway = ToolGateway::with_policy(adjust(config), policy).unwrap();

        Self {
            repo,
            logs,
            root,
            gateway,
        }
    }

    pub fn audit_lines(&self) -> Vec<serde_json::Value> {
        let path = self.logs.path().join("repo_tools.jsonl");
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

pub fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
