use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::io;
use thiserror::Error;

use crate::error::GitError;
use crate::security::validator::SecurityError;

/// Failures of a single tool call, reported to the caller as code -32000
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("{0} is not a directory")]
    NotADirectory(String),

    #[error("Parent directory of '{0}' does not exist")]
    ParentMissing(String),

    #[error("File '{path}' is {size} bytes, over the {limit} byte limit")]
    FileTooLarge { path: String, size: u64, limit: u64 },

    #[error("Search text not found in '{0}'")]
    SearchNotFound(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Git(#[from] GitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ReadFile,
    WriteFile,
    ReplaceInFile,
    ListFiles,
    RunGit,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::ReadFile,
        ToolName::WriteFile,
        ToolName::ReplaceInFile,
        ToolName::ListFiles,
        ToolName::RunGit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ReadFile => "read_file",
            ToolName::WriteFile => "write_file",
            ToolName::ReplaceInFile => "replace_in_file",
            ToolName::ListFiles => "list_files",
            ToolName::RunGit => "run_git",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            ToolName::ReadFile => "Reads a file from the repository.",
            ToolName::WriteFile => "Writes to a file and returns a diff.",
            ToolName::ReplaceInFile => "Replaces text in a file and returns a diff.",
            ToolName::ListFiles => "Lists files in a directory.",
            ToolName::RunGit => "Runs allowed git commands.",
        }
    }

    fn input_schema(&self) -> Value {
        let string = json!({"type": "string"});
        let (properties, required) = match self {
            ToolName::ReadFile | ToolName::ListFiles => (
                json!({"path": string, "role": string}),
                json!(["path", "role"]),
            ),
            ToolName::WriteFile => (
                json!({"path": string, "content": string, "role": string}),
                json!(["path", "content", "role"]),
            ),
            ToolName::ReplaceInFile => (
                json!({"path": string, "search": string, "replace": string, "role": string}),
                json!(["path", "search", "replace", "role"]),
            ),
            ToolName::RunGit => (
                json!({"args": {"type": "array", "items": string}, "role": string}),
                json!(["args", "role"]),
            ),
        };

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of every tool, as returned by `tools/list`
pub fn tool_schemas() -> Value {
    let tools: Vec<Value> = ToolName::ALL
        .iter()
        .map(|t| {
            json!({
                "name": t.as_str(),
                "description": t.description(),
                "inputSchema": t.input_schema(),
            })
        })
        .collect();

    json!({ "tools": tools })
}

/// A decoded tool invocation with typed arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    ReadFile { path: String },
    WriteFile { path: String, content: String },
    ReplaceInFile { path: String, search: String, replace: String },
    ListFiles { path: String },
    RunGit { args: Vec<String> },
}

#[derive(Deserialize)]
struct PathArgs {
    path: String,
}

#[derive(Deserialize)]
struct WriteArgs {
    path: String,
    content: String,
}

#[derive(Deserialize)]
struct ReplaceArgs {
    path: String,
    search: String,
    replace: String,
}

#[derive(Deserialize)]
struct GitArgs {
    args: Vec<String>,
}

impl Tool {
    /// Decode `arguments` for the tool called `name`
    pub fn decode(name: &str, arguments: &Value) -> Result<Self, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let tool = match tool {
            ToolName::ReadFile => {
                let a: PathArgs = decode_args(tool, arguments)?;
                Tool::ReadFile { path: a.path }
            }
            ToolName::WriteFile => {
                let a: WriteArgs = decode_args(tool, arguments)?;
                Tool::WriteFile {
                    path: a.path,
                    content: a.content,
                }
            }
            ToolName::ReplaceInFile => {
                let a: ReplaceArgs = decode_args(tool, arguments)?;
                Tool::ReplaceInFile {
                    path: a.path,
                    search: a.search,
                    replace: a.replace,
                }
            }
            ToolName::ListFiles => {
                let a: PathArgs = decode_args(tool, arguments)?;
                Tool::ListFiles { path: a.path }
            }
            ToolName::RunGit => {
                let a: GitArgs = decode_args(tool, arguments)?;
                Tool::RunGit { args: a.args }
            }
        };

        Ok(tool)
    }

    pub fn name(&self) -> ToolName {
        match self {
            Tool::ReadFile { .. } => ToolName::ReadFile,
            Tool::WriteFile { .. } => ToolName::WriteFile,
            Tool::ReplaceInFile { .. } => ToolName::ReplaceInFile,
            Tool::ListFiles { .. } => ToolName::ListFiles,
            Tool::RunGit { .. } => ToolName::RunGit,
        }
    }
}

fn decode_args<T>(tool: ToolName, arguments: &Value) -> Result<T, ToolError>
where
    T: for<'de> Deserialize<'de>,
{
    T::deserialize(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.as_str().to_string(),
        message: e.to_string(),
    })
}

/// One request's worth of work: who is calling and what they asked for
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: Value,
    pub role: String,
    pub tool: Tool,
}

/// Work out the calling role for a `tools/call`
///
/// A pinned session role always wins and is written back into `arguments`
/// so the audit trail shows the role that actually ran. Without one, the
/// caller must supply a string `role` argument.
pub fn resolve_role(
    arguments: &mut Value,
    session_role: Option<&str>,
    tool: &str,
) -> Result<String, ToolError> {
    if let Some(role) = session_role {
        if let Some(map) = arguments.as_object_mut() {
            map.insert("role".to_string(), Value::String(role.to_string()));
        }
        return Ok(role.to_string());
    }

    arguments
        .get("role")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: tool.to_string(),
            message: "missing string argument 'role'".to_string(),
        })
}
