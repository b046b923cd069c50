//! Hostinfo MCP Server
//!
//! A Model Context Protocol (MCP) server speaking newline-delimited JSON-RPC
//! over stdio. It advertises two tools, two file resources and two prompt
//! templates, and ships a small driver that runs one request against it.
//!
//! # Architecture
//!
//! 1. **MCP Layer** (`mcp`) - protocol types, transport, catalogs, router, server loop
//! 2. **Tools Layer** (`tools`) - `get_system_info` and `get_random_data`
//! 3. **Driver** (`client`) - spawns the server and sends a single request
//!
//! # Error model
//!
//! Protocol failures (unknown method, bad params, unknown tool or prompt,
//! handler crashes) are JSON-RPC `error` responses. Failures of a tool's own
//! work (an unreachable API, an unreadable file) are successful responses
//! whose payload sets `isError`.

pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod metrics;
pub mod tools;

pub use error::{Error, Result};

/// Server version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name reported in `initialize`.
pub const SERVER_NAME: &str = "hostinfo-mcp";
