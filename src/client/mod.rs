//! One-shot driver for the server.
//!
//! Spawns the server binary, sends the single request that corresponds to a
//! subcommand, waits for the first response line and renders it.

use anyhow::{anyhow, bail, Context};
use clap::Subcommand;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::tools::system_info::SystemInfo;

/// Substring of the server's startup log line, hidden when forwarding stderr.
const STARTUP_MARKER: &str = "MCP server started";

/// Name of the server binary looked up next to the driver.
pub const SERVER_BINARY: &str = "hostinfo-mcp";

/// The requests the driver knows how to send.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DriverCommand {
    /// List available tools
    ListTools,
    /// Get system information
    SystemInfo,
    /// Get random todo data from the API
    RandomData {
        /// Todo id (1-100); random when omitted
        #[arg(long)]
        id: Option<i64>,
    },
    /// List available resources
    ListResources,
    /// List available prompts
    ListPrompts,
}

impl DriverCommand {
    /// The JSON-RPC request this command sends.
    pub fn request(&self) -> JsonRpcRequest {
        match self {
            Self::ListTools => JsonRpcRequest::new(1, "tools/list", json!({})),
            Self::SystemInfo => JsonRpcRequest::new(
                2,
                "tools/call",
                json!({"name": "get_system_info", "arguments": {}}),
            ),
            Self::RandomData { id } => {
                let arguments = match id {
                    Some(id) => json!({ "id": id }),
                    None => json!({}),
                };
                JsonRpcRequest::new(
                    3,
                    "tools/call",
                    json!({"name": "get_random_data", "arguments": arguments}),
                )
            }
            Self::ListResources => JsonRpcRequest::new(4, "resources/list", json!({})),
            Self::ListPrompts => JsonRpcRequest::new(5, "prompts/list", json!({})),
        }
    }
}

/// Output of a rendered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// Render a response the way the driver prints it.
pub fn render(command: &DriverCommand, response: &JsonRpcResponse) -> Rendered {
    if let Some(error) = response.error() {
        let body = serde_json::to_string_pretty(error).unwrap_or_else(|_| error.message.clone());
        return Rendered {
            stdout: String::new(),
            stderr: format!("\n=== MCP Error ===\n{}\n", body),
            success: false,
        };
    }

    let result = response.result().cloned().unwrap_or(Value::Null);
    let body = match command {
        DriverCommand::SystemInfo => system_info_from_result(&result)
            .map(|info| format_system_info(&info))
            .unwrap_or_else(|| pretty(&result)),
        _ => pretty(&result),
    };

    Rendered {
        stdout: format!("\n=== MCP Response ===\n{}\n", body),
        stderr: String::new(),
        success: true,
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn system_info_from_result(result: &Value) -> Option<SystemInfo> {
    let text = result.get("content")?.get(0)?.get("text")?.as_str()?;
    serde_json::from_str(text).ok()
}

fn megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Human-readable system information.
pub fn format_system_info(info: &SystemInfo) -> String {
    let mem = &info.memory_usage;
    let mut out = String::from("System Information:\n");
    out.push_str(&format!("  Platform: {}\n", info.platform));
    out.push_str(&format!("  Server Version: {}\n", info.runtime_version));
    if let Some(os) = &info.os_version {
        out.push_str(&format!("  OS: {}\n", os));
    }
    out.push_str(&format!("  Architecture: {}\n", info.arch));
    out.push_str(&format!("  Current Directory: {}\n", info.cwd));
    out.push_str(&format!("  Environment Variables: {}\n", info.env));
    out.push_str(&format!("  Process ID: {}\n", info.pid));
    out.push_str("  Memory Usage:\n");
    out.push_str(&format!("    RSS: {}\n", megabytes(mem.rss)));
    out.push_str(&format!("    Virtual: {}\n", megabytes(mem.virtual_size)));
    out.push_str(&format!("    System Total: {}\n", megabytes(mem.system_total)));
    out.push_str(&format!("    System Used: {}\n", megabytes(mem.system_used)));
    out.push_str(&format!(
        "    System Available: {}\n",
        megabytes(mem.system_available)
    ));
    out.push_str(&format!("  Uptime: {:.2} seconds", info.uptime));
    out
}

/// Locate the server binary next to the running executable.
pub fn default_server_path() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot determine current executable")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow!("executable has no parent directory"))?;
    Ok(dir.join(format!("{}{}", SERVER_BINARY, std::env::consts::EXE_SUFFIX)))
}

/// Spawns the server for each request.
#[derive(Debug, Clone)]
pub struct Driver {
    server: PathBuf,
    timeout: Duration,
    forward_stderr: bool,
}

impl Driver {
    pub fn new(server: impl AsRef<Path>) -> Self {
        Self {
            server: server.as_ref().to_path_buf(),
            timeout: Duration::from_secs(30),
            forward_stderr: false,
        }
    }

    /// Upper bound on waiting for the response.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Forward server log lines (minus the startup line) to our stderr.
    pub fn with_forwarded_stderr(mut self, forward: bool) -> Self {
        self.forward_stderr = forward;
        self
    }

    /// Send one request and return the first response the server writes.
    pub async fn send(&self, request: &JsonRpcRequest) -> anyhow::Result<JsonRpcResponse> {
        let mut child = Command::new(&self.server)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if self.forward_stderr {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start server {}", self.server.display()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if !line.contains(STARTUP_MARKER) {
                        eprintln!("Server stderr: {}", line);
                    }
                }
            });
        }

        let mut stdin = child.stdin.take().context("server stdin unavailable")?;
        let stdout = child.stdout.take().context("server stdout unavailable")?;

        let mut frame = serde_json::to_vec(request)?;
        frame.push(b'\n');
        stdin.write_all(&frame).await?;
        stdin.flush().await?;

        let mut lines = BufReader::new(stdout).lines();
        let line = tokio::time::timeout(self.timeout, async {
            loop {
                match lines.next_line().await? {
                    Some(line) if line.trim().is_empty() => continue,
                    other => return Ok::<_, std::io::Error>(other),
                }
            }
        })
        .await
        .map_err(|_| anyhow!("no response within {:?}", self.timeout))??;

        drop(stdin);
        let _ = child.kill().await;

        let Some(line) = line else {
            bail!("server exited without responding");
        };
        serde_json::from_str(&line).with_context(|| format!("Raw output: {}", line))
    }
}
