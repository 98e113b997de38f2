//! Command-line and environment configuration.
//!
//! Every flag has a `TOPICNOTES_*` environment fallback; `.env` files are
//! loaded before parsing.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use topicnotes_core::DEFAULT_WIKIPEDIA_ENDPOINT;
use topicnotes_rpc::{RetryPolicy, DEFAULT_RPC_PATH};

#[derive(Debug, Parser)]
#[command(name = "topicnotes", version, about = "Topic/note server, client and load harness")]
pub struct Cli {
    /// trace|debug|info|warn|error; defaults depend on the subcommand.
    #[arg(long, global = true, env = "TOPICNOTES_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for rotating log files, relative to the working directory
    /// unless absolute; stderr when unset.
    #[arg(long, global = true, env = "TOPICNOTES_LOG_DIR")]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the note server.
    Serve(ServeArgs),
    /// Interactive menu client.
    Client(ClientArgs),
    /// Fire N concurrent simulated clients and print a summary.
    Stress(StressArgs),
}

impl Command {
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Self::Serve(_) => topicnotes_core::default_log_level(),
            Self::Client(_) => "warn",
            Self::Stress(_) => "info",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, env = "TOPICNOTES_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    #[arg(long, env = "TOPICNOTES_RPC_PATH", default_value = DEFAULT_RPC_PATH)]
    pub rpc_path: String,

    #[arg(long, env = "TOPICNOTES_DATABASE", default_value = "database.xml")]
    pub database: PathBuf,

    #[arg(long, env = "TOPICNOTES_WIKIPEDIA_ENDPOINT", default_value = DEFAULT_WIKIPEDIA_ENDPOINT)]
    pub wikipedia_endpoint: String,

    /// Upper bound for one encyclopedia request.
    #[arg(long, env = "TOPICNOTES_LOOKUP_TIMEOUT_SECS", default_value_t = 10)]
    pub lookup_timeout_secs: u64,
}

/// Validated server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub rpc_path: String,
    pub database: PathBuf,
    pub wikipedia_endpoint: String,
    pub lookup_timeout: Duration,
}

impl ServeArgs {
    pub fn into_config(self) -> Result<ServeConfig> {
        if !self.rpc_path.starts_with('/') {
            bail!("rpc path must start with `/`, got `{}`", self.rpc_path);
        }
        if self.lookup_timeout_secs == 0 {
            bail!("lookup timeout must be at least one second");
        }
        if self.database.as_os_str().is_empty() {
            bail!("database path cannot be empty");
        }
        Ok(ServeConfig {
            bind: self.bind,
            rpc_path: self.rpc_path,
            database: self.database,
            wikipedia_endpoint: self.wikipedia_endpoint,
            lookup_timeout: Duration::from_secs(self.lookup_timeout_secs),
        })
    }
}

#[derive(Debug, Clone, Args)]
pub struct ClientArgs {
    /// Full RPC endpoint URL.
    #[arg(long, env = "TOPICNOTES_SERVER", default_value = "http://127.0.0.1:3000/RPC2")]
    pub server: String,

    #[arg(long, env = "TOPICNOTES_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Base backoff; attempt n waits n times this long.
    #[arg(long, env = "TOPICNOTES_BACKOFF_MS", default_value_t = 500)]
    pub backoff_ms: u64,
}

impl ClientArgs {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms))
    }
}

#[derive(Debug, Clone, Args)]
pub struct StressArgs {
    /// Number of simulated clients.
    pub clients: usize,

    #[command(flatten)]
    pub client: ClientArgs,
}
