//! MCP tool implementations.
//!
//! - `system_info` - host and process snapshot
//! - `random_data` - todo item fetched from a placeholder API

pub mod random_data;
pub mod system_info;

use crate::config::Config;
use crate::error::Result;
use crate::mcp::handler::ToolRegistry;

/// Build the tool registry. Order here is the order `tools/list` reports.
pub fn register_all_tools(config: &Config) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(system_info::SystemInfoTool::new());
    registry.register(random_data::RandomDataTool::new(
        random_data::TodoClient::new(&config.todo_api_url, config.fetch_timeout_secs)?,
    ));
    Ok(registry)
}
