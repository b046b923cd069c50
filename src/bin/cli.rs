//! Demo driver: runs one request against the hostinfo MCP server.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use hostinfo_mcp::client::{default_server_path, render, Driver, DriverCommand};

/// Command-line arguments for the driver.
#[derive(Parser, Debug)]
#[command(name = "hostinfo-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Send a single request to the hostinfo MCP server and print the response")]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Path to the server binary (defaults to hostinfo-mcp next to this executable)
    #[arg(long, env = "HOSTINFO_MCP_SERVER")]
    server: Option<PathBuf>,

    /// Seconds to wait for the response
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Forward server log output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: DriverCommand,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let server = match cli.server {
        Some(path) => path,
        None => default_server_path()?,
    };

    let driver = Driver::new(server)
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_forwarded_stderr(cli.verbose);

    let response = driver.send(&cli.command.request()).await?;
    let rendered = render(&cli.command, &response);
    print!("{}", rendered.stdout);
    eprint!("{}", rendered.stderr);

    Ok(if rendered.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
