use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::Utc;
use serde::Serialize;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Longest argument/result/error text kept in a record
pub const SUMMARY_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

/// One audited tool call
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub role: Option<String>,
    pub tool: String,
    pub arguments: String,
    pub outcome: Outcome,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl AuditEntry {
    pub fn success(
        tool: &str,
        role: Option<&str>,
        arguments: &serde_json::Value,
        result: &str,
    ) -> Self {
        Self::new(tool, role, arguments, Outcome::Success, Some(result), None)
    }

    pub fn failure(
        tool: &str,
        role: Option<&str>,
        arguments: &serde_json::Value,
        error: &str,
    ) -> Self {
        Self::new(tool, role, arguments, Outcome::Error, None, Some(error))
    }

    fn new(
        tool: &str,
        role: Option<&str>,
        arguments: &serde_json::Value,
        outcome: Outcome,
        result: Option<&str>,
        error: Option<&str>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            role: role.map(str::to_string),
            tool: tool.to_string(),
            arguments: truncate_summary(&arguments.to_string()),
            outcome,
            result: result.map(truncate_summary),
            error: error.map(truncate_summary),
        }
    }
}

/// Cut `text` to `SUMMARY_LIMIT` characters, marking the cut with `...`
pub fn truncate_summary(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Append-only JSON-lines audit trail
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create an AuditLogger with a custom log path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        // Ensure directory exists
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    /// Record an entry, best effort
    ///
    /// The outcome being recorded is already decided, so a failed write is
    /// reported through tracing and otherwise ignored.
    pub fn record(&self, entry: &AuditEntry) {
        if let Err(e) = self.try_record(entry) {
            tracing::warn!(
                log = %self.log_path.display(),
                tool = %entry.tool,
                "failed to write audit record: {}",
                e
            );
        }
    }

    pub fn try_record(&self, entry: &AuditEntry) -> std::io::Result<()> {
        // Check and rotate log if needed
        self.rotate_if_needed()?;

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(line.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Rotate log file if it exceeds MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            // Rotate: repo_tools.jsonl -> repo_tools.jsonl.1
            fs::rename(&self.log_path, self.backup_path())?;
        }

        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.log_path.as_os_str().to_owned();
        name.push(".1");
        PathBuf::from(name)
    }

    /// Get the path to the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
