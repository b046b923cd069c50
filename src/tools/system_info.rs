//! `get_system_info`: a snapshot of the host and of this process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::info;

use crate::error::Result;
use crate::mcp::handler::{success_result, Arguments, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::metrics::Timer;
use crate::VERSION;

/// Tool name.
pub const NAME: &str = "get_system_info";

/// Snapshot returned by the tool, serialized as pretty JSON text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub platform: String,
    pub runtime_version: String,
    pub os_version: Option<String>,
    pub arch: String,
    pub cwd: String,
    /// Number of environment variables.
    pub env: usize,
    pub pid: u32,
    pub memory_usage: MemoryUsage,
    /// Seconds since the server started.
    pub uptime: f64,
}

/// Memory figures in bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    /// Resident set size of this process.
    pub rss: u64,
    /// Virtual memory size of this process.
    #[serde(rename = "virtual")]
    pub virtual_size: u64,
    pub system_total: u64,
    pub system_used: u64,
    pub system_available: u64,
}

/// System info tool.
pub struct SystemInfoTool {
    started: Timer,
}

impl SystemInfoTool {
    pub fn new() -> Self {
        Self {
            started: Timer::start(),
        }
    }

    /// Collect the snapshot.
    pub fn collect(&self) -> SystemInfo {
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[Pid::from_u32(pid)]),
            true,
            ProcessRefreshKind::everything(),
        );

        let (rss, virtual_size) = sys
            .process(Pid::from_u32(pid))
            .map(|p| (p.memory(), p.virtual_memory()))
            .unwrap_or_default();

        SystemInfo {
            platform: std::env::consts::OS.to_string(),
            runtime_version: format!("hostinfo-mcp/{}", VERSION),
            os_version: System::long_os_version(),
            arch: std::env::consts::ARCH.to_string(),
            cwd: std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|e| format!("<unavailable: {}>", e)),
            env: std::env::vars_os().count(),
            pid,
            memory_usage: MemoryUsage {
                rss,
                virtual_size,
                system_total: sys.total_memory(),
                system_used: sys.used_memory(),
                system_available: sys.available_memory(),
            },
            uptime: self.started.elapsed_secs(),
        }
    }
}

impl Default for SystemInfoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for SystemInfoTool {
    fn definition(&self) -> Tool {
        Tool {
            name: NAME.to_string(),
            description: "Get system information about the current environment".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    async fn execute(&self, _args: Arguments) -> Result<ToolResult> {
        info!("Executing {} tool", NAME);
        let snapshot = self.collect();
        let text = serde_json::to_string_pretty(&snapshot)?;
        info!("{} completed successfully", NAME);
        Ok(success_result(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::ContentBlock;

    #[test]
    fn test_definition() {
        let tool = SystemInfoTool::new();
        let def = tool.definition();
        assert_eq!(def.name, "get_system_info");
        assert_eq!(def.input_schema["type"], "object");
        assert!(def.input_schema["required"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_collect_reports_this_process() {
        let info = SystemInfoTool::new().collect();
        assert_eq!(info.platform, std::env::consts::OS);
        assert_eq!(info.arch, std::env::consts::ARCH);
        assert_eq!(info.pid, std::process::id());
        assert!(info.uptime >= 0.0);
        assert!(info.memory_usage.system_total >= info.memory_usage.system_available);
    }

    #[tokio::test]
    async fn test_execute_returns_single_json_block() {
        let tool = SystemInfoTool::new();
        let result = tool.execute(Arguments::new()).await.unwrap();

        assert!(!result.is_error);
        assert_eq!(result.content.len(), 1);
        let ContentBlock::Text { text } = &result.content[0];
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        assert!(parsed["memoryUsage"]["rss"].is_u64());
        assert!(parsed["memoryUsage"]["virtual"].is_u64());
        assert!(parsed["env"].is_u64());
        assert!(parsed["uptime"].is_f64());
        assert!(parsed["runtimeVersion"]
            .as_str()
            .unwrap()
            .starts_with("hostinfo-mcp/"));
    }
}
