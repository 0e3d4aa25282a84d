use serde_json::Value;
use std::fs;
use std::io::{self, BufRead, ErrorKind, Write};
use std::path::Path;

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::policy::Policy;
use crate::config::settings::{ConfigError, GatewayConfig};
use crate::error::AppResult;
use crate::gateway::diff::unified_diff;
use crate::gateway::protocol::{
    CallParams, INVALID_REQUEST, METHOD_NOT_FOUND, Method, RpcRequest, RpcResponse, TOOL_ERROR,
};
use crate::gateway::tools::{Tool, ToolCall, ToolError, resolve_role, tool_schemas};
use crate::git::GitExecutor;
use crate::security::{GitCommandValidator, Operation, PathDecision, PathValidator};

/// Dispatches tool calls against one repository under the loaded policy
pub struct ToolGateway {
    paths: PathValidator,
    git_validator: GitCommandValidator,
    executor: GitExecutor,
    audit: AuditLogger,
    max_file_bytes: u64,
    session_role: Option<String>,
}

impl ToolGateway {
    /// Build a gateway, loading the policy file named by `config`
    pub fn new(config: GatewayConfig) -> AppResult<Self> {
        let policy = Policy::load(&config.policy_path)?;
        Self::with_policy(config, policy)
    }

    /// Build a gateway from an already-loaded policy
    pub fn with_policy(config: GatewayConfig, policy: Policy) -> AppResult<Self> {
        config.validate()?;

        if let Some(role) = &config.session_role {
            if policy.role(role).is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "session role '{}' is not defined in the policy",
                    role
                ))
                .into());
            }
        }
        if policy.role(&config.mutating_role).is_err() {
            tracing::warn!(
                role = %config.mutating_role,
                "mutating role is not defined in the policy; no role can add, commit or checkout"
            );
        }

        let git_validator = GitCommandValidator::from_policy(&policy, config.mutating_role.clone());
        let paths = PathValidator::new(&config.repo_root, policy).map_err(|e| {
            ConfigError::InvalidValue(format!("repository root is not usable: {}", e))
        })?;
        let executor = GitExecutor::with_timeout(paths.repo_root(), config.git_timeout());
        let audit = AuditLogger::with_path(config.audit_log_path())?;

        Ok(Self {
            paths,
            git_validator,
            executor,
            audit,
            max_file_bytes: config.max_file_bytes,
            session_role: config.session_role,
        })
    }

    /// Serve requests line by line until `reader` reaches EOF
    ///
    /// Each line is fully handled and its response flushed before the next
    /// one is read. Bad lines never stop the loop; only transport errors do.
    pub fn serve<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> io::Result<()> {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line) {
                serde_json::to_writer(&mut writer, &response)?;
                writer.write_all(b"\n")?;
                writer.flush()?;
            }
        }

        Ok(())
    }

    /// Handle one raw request line; `None` means there is nothing to answer
    pub fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("failed to parse request: {}", e);
                return None;
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<RpcRequest>(value) {
            Ok(request) => Some(self.handle_request(request)),
            Err(e) => {
                tracing::error!("malformed request: {}", e);
                id.map(|id| RpcResponse::error(id, INVALID_REQUEST, "Invalid Request"))
            }
        }
    }

    pub fn handle_request(&self, request: RpcRequest) -> RpcResponse {
        match Method::parse(&request.method) {
            Some(Method::ToolsList) => RpcResponse::success(request.id, tool_schemas()),
            Some(Method::ToolsCall) => self.handle_call(request.id, request.params),
            None => {
                tracing::debug!(method = %request.method, "unknown method");
                RpcResponse::error(request.id, METHOD_NOT_FOUND, "Method not found")
            }
        }
    }

    fn handle_call(&self, id: Value, params: Value) -> RpcResponse {
        let CallParams { name, mut arguments } = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                let err = ToolError::InvalidArguments {
                    tool: "tools/call".to_string(),
                    message: e.to_string(),
                };
                self.audit
                    .record(&AuditEntry::failure("unknown", None, &Value::Null, &err.to_string()));
                return RpcResponse::error(id, TOOL_ERROR, err.to_string());
            }
        };

        let role = resolve_role(&mut arguments, self.session_role.as_deref(), &name);
        let outcome = role.and_then(|role| {
            let tool = Tool::decode(&name, &arguments)?;
            let call = ToolCall {
                id: id.clone(),
                role,
                tool,
            };
            self.call(&call)
        });

        let role = arguments.get("role").and_then(Value::as_str);
        match outcome {
            Ok(text) => {
                self.audit
                    .record(&AuditEntry::success(&name, role, &arguments, &text));
                RpcResponse::text(id, text)
            }
            Err(err) => {
                let message = err.to_string();
                tracing::debug!(tool = %name, "tool call failed: {}", message);
                self.audit
                    .record(&AuditEntry::failure(&name, role, &arguments, &message));
                RpcResponse::error(id, TOOL_ERROR, message)
            }
        }
    }

    /// Run one decoded call
    pub fn call(&self, call: &ToolCall) -> Result<String, ToolError> {
        tracing::debug!(tool = %call.tool.name(), role = %call.role, "dispatching tool call");

        match &call.tool {
            Tool::ReadFile { path } => self.read_file(path, &call.role),
            Tool::WriteFile { path, content } => self.write_file(path, content, &call.role),
            Tool::ReplaceInFile {
                path,
                search,
                replace,
            } => self.replace_in_file(path, search, replace, &call.role),
            Tool::ListFiles { path } => self.list_files(path, &call.role),
            Tool::RunGit { args } => self.run_git(args, &call.role),
        }
    }

    pub fn read_file(&self, path: &str, role: &str) -> Result<String, ToolError> {
        let decision = self.paths.validate_path(path, role, Operation::Read)?;
        self.check_size(&decision)?;

        read_text(&decision)?.ok_or_else(|| ToolError::NotFound(decision.relative_path.clone()))
    }

    /// Overwrite (or create) a file and return the diff against its prior content
    pub fn write_file(&self, path: &str, content: &str, role: &str) -> Result<String, ToolError> {
        let decision = self.paths.validate_path(path, role, Operation::Write)?;
        self.check_content_size(&decision, content)?;
        self.check_size(&decision)?;

        let old_content = read_text(&decision)?.unwrap_or_default();
        write_text(&decision, content)?;

        Ok(unified_diff(&decision.relative_path, &old_content, content))
    }

    /// Replace every occurrence of `search` in an existing file and return the diff
    pub fn replace_in_file(
        &self,
        path: &str,
        search: &str,
        replace: &str,
        role: &str,
    ) -> Result<String, ToolError> {
        let decision = self.paths.validate_path(path, role, Operation::Write)?;
        if search.is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: "replace_in_file".to_string(),
                message: "search text must not be empty".to_string(),
            });
        }
        self.check_size(&decision)?;

        let old_content = read_text(&decision)?
            .ok_or_else(|| ToolError::NotFound(decision.relative_path.clone()))?;
        if !old_content.contains(search) {
            return Err(ToolError::SearchNotFound(decision.relative_path.clone()));
        }

        let new_content = old_content.replace(search, replace);
        self.check_content_size(&decision, &new_content)?;
        write_text(&decision, &new_content)?;

        Ok(unified_diff(&decision.relative_path, &old_content, &new_content))
    }

    /// Sorted directory entries, one per line, directories suffixed with `/`
    pub fn list_files(&self, path: &str, role: &str) -> Result<String, ToolError> {
        let decision = self.paths.validate_path(path, role, Operation::Read)?;
        let rel = &decision.relative_path;

        let metadata = fs::metadata(&decision.absolute_path).map_err(|e| io_error(rel, e))?;
        if !metadata.is_dir() {
            return Err(ToolError::NotADirectory(rel.clone()));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&decision.absolute_path).map_err(|e| io_error(rel, e))? {
            let entry = entry.map_err(|e| io_error(rel, e))?;
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() {
                name.push('/');
            }
            entries.push(name);
        }
        entries.sort();

        Ok(entries.join("\n"))
    }

    /// Run an allowed git command in the repository root
    ///
    /// A failing command is a normal result prefixed with `Git Error:`.
    pub fn run_git(&self, args: &[String], role: &str) -> Result<String, ToolError> {
        self.git_validator.validate(args, role)?;

        let output = self.executor.execute(args)?;
        if output.success {
            Ok(output.stdout)
        } else {
            Ok(format!("Git Error: {}", output.stderr))
        }
    }

    fn check_size(&self, decision: &PathDecision) -> Result<(), ToolError> {
        match fs::metadata(&decision.absolute_path) {
            Ok(meta) if meta.is_file() && meta.len() > self.max_file_bytes => {
                Err(ToolError::FileTooLarge {
                    path: decision.relative_path.clone(),
                    size: meta.len(),
                    limit: self.max_file_bytes,
                })
            }
            _ => Ok(()),
        }
    }

    fn check_content_size(&self, decision: &PathDecision, content: &str) -> Result<(), ToolError> {
        let size = content.len() as u64;
        if size > self.max_file_bytes {
            return Err(ToolError::FileTooLarge {
                path: decision.relative_path.clone(),
                size,
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }

    pub fn repo_root(&self) -> &Path {
        self.paths.repo_root()
    }

    pub fn audit_log_path(&self) -> &Path {
        self.audit.log_path()
    }
}

/// Read a file as UTF-8; `None` if it doesn't exist
fn read_text(decision: &PathDecision) -> Result<Option<String>, ToolError> {
    match fs::read_to_string(&decision.absolute_path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(&decision.relative_path, e)),
    }
}

/// Write without creating directories
fn write_text(decision: &PathDecision, content: &str) -> Result<(), ToolError> {
    let parent_exists = decision
        .absolute_path
        .parent()
        .is_some_and(|parent| parent.is_dir());
    if !parent_exists {
        return Err(ToolError::ParentMissing(decision.relative_path.clone()));
    }

    fs::write(&decision.absolute_path, content).map_err(|e| io_error(&decision.relative_path, e))
}

fn io_error(path: &str, source: io::Error) -> ToolError {
    if source.kind() == ErrorKind::NotFound {
        return ToolError::NotFound(path.to_string());
    }
    ToolError::Io {
        path: path.to_string(),
        source,
    }
}
