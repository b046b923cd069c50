//! Tool handler trait and the ordered tool registry.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::mcp::protocol::{ContentBlock, Tool, ToolResult};

/// Tool call arguments as received in `tools/call`.
pub type Arguments = Map<String, Value>;

/// Handler for MCP tool calls.
///
/// `execute` returns `Err` only for protocol-level problems (bad arguments).
/// Failures of the tool's own work are reported with [`error_result`].
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> Tool;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: Arguments) -> Result<ToolResult>;
}

/// Registry of tool handlers, listed in registration order.
pub struct ToolRegistry {
    tools: Vec<(Tool, Arc<dyn ToolHandler>)>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool handler. A later registration under the same name
    /// replaces the earlier one in place.
    pub fn register<T: ToolHandler + 'static>(&mut self, handler: T) {
        self.register_arc(Arc::new(handler));
    }

    /// Register a tool handler (Arc version).
    pub fn register_arc(&mut self, handler: Arc<dyn ToolHandler>) {
        let tool = handler.definition();
        match self.index.get(&tool.name) {
            Some(&slot) => self.tools[slot] = (tool, handler),
            None => {
                self.index.insert(tool.name.clone(), self.tools.len());
                self.tools.push((tool, handler));
            }
        }
    }

    /// Get all registered tools.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|(tool, _)| tool.clone()).collect()
    }

    /// Get a tool by name.
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.index
            .get(name)
            .map(|&slot| Arc::clone(&self.tools[slot].1))
    }

    /// Check if a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get the number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to create a text content block.
pub fn text_content(text: impl Into<String>) -> ContentBlock {
    ContentBlock::Text { text: text.into() }
}

/// Helper to create a successful tool result.
pub fn success_result(text: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![text_content(text)],
        is_error: false,
    }
}

/// Helper to create an error tool result.
pub fn error_result(text: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![text_content(text)],
        is_error: true,
    }
}

/// Helper to extract an optional integer argument.
///
/// Integral floats such as `7.0` are accepted since the schema declares a
/// JSON number. `null` counts as absent.
pub fn get_optional_int_arg(args: &Arguments, name: &str) -> Result<Option<i64>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            if let Some(n) = v.as_i64() {
                return Ok(Some(n));
            }
            match v.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(Some(f as i64))
                }
                _ => Err(Error::InvalidToolArguments(format!(
                    "Argument '{}' must be an integer, got {}",
                    name, v
                ))),
            }
        }
    }
}
