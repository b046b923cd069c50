//! Hostinfo MCP Server
//!
//! Serves MCP over stdio. Logs go to stderr.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hostinfo_mcp::config::{Args, Config};
use hostinfo_mcp::error::{Error, Result};
use hostinfo_mcp::mcp::prompts::PromptRegistry;
use hostinfo_mcp::mcp::resources::ResourceRegistry;
use hostinfo_mcp::mcp::{DispatchMode, McpServer, Router, StdioTransport};
use hostinfo_mcp::{tools, SERVER_NAME, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Build configuration from args
    let config: Config = args.into();

    init_logging(&config)?;

    info!("Hostinfo MCP Server v{}", VERSION);
    info!("Resource root: {:?}", config.root);
    info!("Todo API: {}", config.todo_api_url);

    let tools = tools::register_all_tools(&config)?;
    info!("Registered {} MCP tools", tools.tool_count());

    let router = Router::new(
        tools,
        ResourceRegistry::new(&config.root),
        PromptRegistry::new(),
        SERVER_NAME,
    );

    let mode = if config.concurrent {
        DispatchMode::Concurrent
    } else {
        DispatchMode::Serial
    };

    McpServer::new(router)
        .with_mode(mode)
        .run(StdioTransport::new())
        .await
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--debug` when set.
fn init_logging(config: &Config) -> Result<()> {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let installed = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| Error::Config(format!("Failed to set tracing subscriber: {}", e)))
}
