//! Request routing.
//!
//! Method names are turned into a typed [`McpRequest`] once, and every
//! handler is reached through an exhaustive match on it. Failures of any kind,
//! panics included, become a JSON-RPC error response at this boundary.

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::mcp::handler::ToolRegistry;
use crate::mcp::prompts::{ListPromptsResult, PromptRegistry};
use crate::mcp::protocol::*;
use crate::mcp::resources::ResourceRegistry;
use crate::metrics::{Metrics, Timer};
use crate::VERSION;

/// Params of `resources/read`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadResourceParams {
    pub uri: String,
}

/// Params of `prompts/get`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetPromptParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}

/// Params of `initialize`. Only the parts worth logging are read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub client_info: Option<Value>,
}

/// Every request the server understands, with typed params.
#[derive(Debug, Clone)]
pub enum McpRequest {
    Initialize(InitializeParams),
    Ping,
    ListTools,
    CallTool(CallToolParams),
    ListResources,
    ReadResource(ReadResourceParams),
    ListPrompts,
    GetPrompt(GetPromptParams),
}

impl McpRequest {
    /// Resolve a method name and validate its params.
    pub fn parse(method: &str, params: Option<Value>) -> Result<Self> {
        match method {
            "initialize" => Ok(Self::Initialize(optional_params(params)?)),
            "ping" => no_params(params).map(|_| Self::Ping),
            "tools/list" => no_params(params).map(|_| Self::ListTools),
            "tools/call" => Ok(Self::CallTool(required_params(params)?)),
            "resources/list" => no_params(params).map(|_| Self::ListResources),
            "resources/read" => Ok(Self::ReadResource(required_params(params)?)),
            "prompts/list" => no_params(params).map(|_| Self::ListPrompts),
            "prompts/get" => Ok(Self::GetPrompt(required_params(params)?)),
            _ => Err(Error::MethodNotFound(method.to_string())),
        }
    }
}

fn required_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let params = params.ok_or_else(|| Error::InvalidParams("Missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| Error::InvalidParams(e.to_string()))
}

fn optional_params<T: DeserializeOwned + Default>(params: Option<Value>) -> Result<T> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v).map_err(|e| Error::InvalidParams(e.to_string())),
    }
}

/// List methods take no params, but tolerate an object (e.g. a pagination
/// cursor, which is ignored since catalogs are never paged).
fn no_params(params: Option<Value>) -> Result<()> {
    match params {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(other) => Err(Error::InvalidParams(format!(
            "Expected an object or no params, got {}",
            other
        ))),
    }
}

/// Stateless dispatcher over the immutable catalogs.
#[derive(Clone)]
pub struct Router {
    tools: Arc<ToolRegistry>,
    resources: Arc<ResourceRegistry>,
    prompts: Arc<PromptRegistry>,
    metrics: Arc<Metrics>,
    name: String,
}

impl Router {
    /// Create a router over the given catalogs.
    pub fn new(
        tools: ToolRegistry,
        resources: ResourceRegistry,
        prompts: PromptRegistry,
        name: impl Into<String>,
    ) -> Self {
        Self {
            tools: Arc::new(tools),
            resources: Arc::new(resources),
            prompts: Arc::new(prompts),
            metrics: Metrics::new(),
            name: name.into(),
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Handle one decoded request or notification.
    ///
    /// Returns `None` for notifications, which are never answered.
    pub async fn handle(&self, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
        match req.id {
            Some(id) => Some(self.dispatch(id, &req.method, req.params).await),
            None => {
                self.handle_notification(&req.method);
                None
            }
        }
    }

    /// Dispatch a request and encode the outcome under its id.
    pub async fn dispatch(
        &self,
        id: RequestId,
        method: &str,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        debug!("Handling request: {} (id: {})", method, id);
        self.metrics.inc_requests();
        let timer = Timer::start();

        let outcome = match McpRequest::parse(method, params) {
            Ok(request) => AssertUnwindSafe(self.execute(request))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(Error::Internal(panic_message(panic.as_ref())))),
            Err(e) => Err(e),
        };

        if let Err(ref e) = outcome {
            self.metrics.inc_failed();
            warn!("Request {} ({}) failed: {}", id, method, e);
        }
        debug!("Request {} ({}) done in {}ms", id, method, timer.elapsed_ms());

        JsonRpcResponse::encode(id, outcome)
    }

    fn handle_notification(&self, method: &str) {
        self.metrics.inc_notifications();
        match method {
            "notifications/initialized" => info!("Client initialized"),
            "notifications/cancelled" => {
                debug!("Cancellation requested; requests run to completion")
            }
            _ => debug!("Unknown notification: {}", method),
        }
    }

    async fn execute(&self, request: McpRequest) -> Result<Value> {
        match request {
            McpRequest::Initialize(params) => self.handle_initialize(params),
            McpRequest::Ping => Ok(serde_json::json!({})),
            McpRequest::ListTools => {
                info!("Tools list requested");
                let tools = self.tools.list_tools();
                Ok(serde_json::to_value(ListToolsResult { tools })?)
            }
            McpRequest::CallTool(params) => self.handle_call_tool(params).await,
            McpRequest::ListResources => Ok(serde_json::to_value(self.resources.list())?),
            McpRequest::ReadResource(params) => {
                let result = self.resources.read(&params.uri).await;
                Ok(serde_json::to_value(result)?)
            }
            McpRequest::ListPrompts => {
                info!("Prompts list requested");
                let prompts = self.prompts.list();
                Ok(serde_json::to_value(ListPromptsResult { prompts })?)
            }
            McpRequest::GetPrompt(params) => {
                let result = self
                    .prompts
                    .get(&params.name, params.arguments.unwrap_or_default())
                    .ok_or_else(|| Error::PromptNotFound(params.name.clone()))?;
                Ok(serde_json::to_value(result)?)
            }
        }
    }

    fn handle_initialize(&self, params: InitializeParams) -> Result<Value> {
        info!(
            "Initialize from {} (protocol {})",
            params
                .client_info
                .as_ref()
                .and_then(|c| c.get("name"))
                .and_then(|n| n.as_str())
                .unwrap_or("unknown client"),
            params.protocol_version.as_deref().unwrap_or("unspecified")
        );

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
                resources: Some(ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                }),
                prompts: Some(PromptsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: self.name.clone(),
                version: VERSION.to_string(),
            },
        };

        Ok(serde_json::to_value(result)?)
    }

    async fn handle_call_tool(&self, params: CallToolParams) -> Result<Value> {
        let args = Value::Object(params.arguments.clone());
        info!("Tool call received: {} with args: {}", params.name, args);

        let handler = self.tools.get_tool(&params.name).ok_or_else(|| {
            error!("Unknown tool requested: {}", params.name);
            Error::ToolNotFound(params.name.clone())
        })?;

        self.metrics.inc_tool_calls();
        let result = handler.execute(params.arguments).await?;
        if result.is_error {
            self.metrics.inc_tool_errors();
        }
        Ok(serde_json::to_value(result)?)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("Handler panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("Handler panicked: {}", s)
    } else {
        "Handler panicked".to_string()
    }
}
