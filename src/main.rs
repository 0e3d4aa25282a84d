use clap::Parser;
use scopegate::{GatewayConfig, ToolGateway};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Role-scoped file and git tools for a single repository, served as
/// newline-delimited JSON-RPC over stdin/stdout.
#[derive(Debug, Parser)]
#[command(name = "scopegate", version)]
struct Cli {
    /// TOML settings file; the flags below override its values
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Repository root every path is resolved against [default: .]
    #[arg(long)]
    repo_root: Option<PathBuf>,

    /// Role policy JSON [default: <repo-root>/configs/tool_scopes.json]
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Audit log file [default: <repo-root>/artifacts/logs/repo_tools.jsonl]
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Pin every call to this role, ignoring any role the caller sends
    #[arg(long)]
    role: Option<String>,

    #[arg(long)]
    git_timeout: Option<u64>,

    #[arg(long)]
    max_file_bytes: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Result<GatewayConfig, scopegate::config::ConfigError> {
        let mut config = match &self.settings {
            Some(path) => GatewayConfig::load(path)?,
            None => {
                let root = self.repo_root.clone().unwrap_or_else(|| PathBuf::from("."));
                let policy = root.join("configs").join("tool_scopes.json");
                GatewayConfig::new(root, policy)
            }
        };

        if let Some(root) = self.repo_root {
            config.repo_root = root;
        }
        if let Some(policy) = self.policy {
            config.policy_path = policy;
        }
        if let Some(audit_log) = self.audit_log {
            config.audit_log_path = Some(audit_log);
        }
        if let Some(role) = self.role {
            config.session_role = Some(role);
        }
        if let Some(secs) = self.git_timeout {
            config.git_timeout_seconds = secs;
        }
        if let Some(bytes) = self.max_file_bytes {
            config.max_file_bytes = bytes;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    // Diagnostics go to stderr; stdout carries the protocol
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let gateway = match ToolGateway::new(config) {
        Ok(gateway) => gateway,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        audit_log = %gateway.audit_log_path().display(),
        "scopegate serving on stdio"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = gateway.serve(stdin.lock(), stdout.lock()) {
        tracing::error!("transport failure: {}", e);
        std::process::exit(1);
    }

    tracing::info!("stdin closed, shutting down");
}
