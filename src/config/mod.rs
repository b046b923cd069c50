//! Configuration management for the hostinfo MCP server.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default base URL of the todo placeholder API.
pub const DEFAULT_TODO_API_URL: &str = "https://jsonplaceholder.typicode.com";

/// Default timeout for the external todo fetch, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Command-line arguments for the server.
#[derive(Parser, Debug, Clone)]
#[command(name = "hostinfo-mcp")]
#[command(author = "Hostinfo MCP Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server exposing host information, todo data, resources and prompts over stdio")]
pub struct Args {
    /// Directory the advertised file resources live in
    #[arg(short, long, env = "HOSTINFO_MCP_ROOT")]
    pub root: Option<PathBuf>,

    /// Base URL of the todo API used by get_random_data
    #[arg(long, default_value = DEFAULT_TODO_API_URL, env = "HOSTINFO_MCP_TODO_API_URL")]
    pub todo_api_url: String,

    /// Timeout for the todo fetch (seconds)
    #[arg(long, default_value = "10", env = "HOSTINFO_MCP_FETCH_TIMEOUT")]
    pub fetch_timeout_secs: u64,

    /// Dispatch requests concurrently instead of strictly in arrival order
    #[arg(long, env = "HOSTINFO_MCP_CONCURRENT")]
    pub concurrent: bool,

    /// Enable debug logging
    #[arg(short, long, env = "HOSTINFO_MCP_DEBUG")]
    pub debug: bool,

    /// Emit log lines as JSON
    #[arg(long, env = "HOSTINFO_MCP_LOG_JSON")]
    pub log_json: bool,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Resource root directory
    pub root: PathBuf,
    /// Todo API base URL
    pub todo_api_url: String,
    /// Fetch timeout in seconds
    pub fetch_timeout_secs: u64,
    /// Concurrent dispatch
    pub concurrent: bool,
    /// Debug mode
    pub debug: bool,
    /// JSON log output
    pub log_json: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            root: args.root.unwrap_or_else(current_dir),
            todo_api_url: args.todo_api_url,
            fetch_timeout_secs: args.fetch_timeout_secs,
            concurrent: args.concurrent,
            debug: args.debug,
            log_json: args.log_json,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: current_dir(),
            todo_api_url: DEFAULT_TODO_API_URL.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            concurrent: false,
            debug: false,
            log_json: false,
        }
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
