//! Model Context Protocol (MCP) implementation.
//!
//! # Architecture
//!
//! - `protocol` - JSON-RPC envelopes and MCP payload types
//! - `transport` - Newline-framed stream transport (stdio)
//! - `handler` - Tool handler trait and the tool registry
//! - `resources` - Resource catalog and `file://` reader
//! - `prompts` - Prompt catalog
//! - `router` - Typed request parsing and dispatch
//! - `server` - Read/dispatch/write loop

pub mod handler;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod router;
pub mod server;
pub mod transport;

pub use handler::{ToolHandler, ToolRegistry};
pub use protocol::*;
pub use router::{McpRequest, Router};
pub use server::{DispatchMode, McpServer};
pub use transport::{StdioTransport, StreamTransport, Transport};
