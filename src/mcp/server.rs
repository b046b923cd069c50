//! MCP server implementation.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::mcp::router::Router;
use crate::mcp::transport::{Message, Transport};
use crate::VERSION;

/// How requests read from the transport are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// One request at a time; responses leave in arrival order.
    #[default]
    Serial,
    /// One task per request; responses leave in completion order.
    Concurrent,
}

/// MCP server.
pub struct McpServer {
    router: Arc<Router>,
    mode: DispatchMode,
    /// Requests currently being handled, keyed by id.
    in_flight: Arc<DashMap<RequestId, String>>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
            mode: DispatchMode::Serial,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Choose the dispatch mode.
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of requests that have been read but not yet answered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Run the server with the given transport until the input ends.
    pub async fn run<T: Transport>(&self, mut transport: T) -> Result<()> {
        info!("Starting MCP server v{} ({:?} dispatch)", VERSION, self.mode);

        let (mut incoming, outgoing) = transport.start().await?;
        info!("MCP server started and connected via stdio");

        let mut tasks = JoinSet::new();

        while let Some(msg) = incoming.recv().await {
            match msg {
                Message::Request(req) => match self.mode {
                    DispatchMode::Serial => {
                        if let Some(response) = self.router.handle(req).await {
                            if outgoing.send(response).await.is_err() {
                                error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    DispatchMode::Concurrent => {
                        self.spawn_request(&mut tasks, req, outgoing.clone());
                    }
                },
                Message::Notification(notif) => {
                    self.router.handle(notif).await;
                }
                Message::Invalid { id, error } => {
                    warn!("Rejecting undecodable request {}: {}", id, error);
                    if outgoing
                        .send(JsonRpcResponse::encode(id, Err(error)))
                        .await
                        .is_err()
                    {
                        error!("Failed to send response");
                        break;
                    }
                }
                Message::Response(value) => {
                    warn!("Received unexpected response: {}", value);
                }
            }

            // Reap finished tasks so the set does not grow without bound.
            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    error!("Request task failed: {}", e);
                }
            }
        }

        if !tasks.is_empty() {
            debug!("Input closed; waiting for {} in-flight requests", tasks.len());
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Request task failed: {}", e);
            }
        }

        drop(outgoing);
        transport.stop().await?;
        info!(
            "MCP server stopped: {:?}",
            self.router.metrics().snapshot()
        );
        Ok(())
    }

    fn spawn_request(
        &self,
        tasks: &mut JoinSet<()>,
        req: JsonRpcRequest,
        outgoing: mpsc::Sender<JsonRpcResponse>,
    ) {
        let router = Arc::clone(&self.router);
        let in_flight = Arc::clone(&self.in_flight);

        if let Some(id) = &req.id {
            if let Some(previous) = in_flight.insert(id.clone(), req.method.clone()) {
                warn!(
                    "Request id {} reused while {} is still in flight",
                    id, previous
                );
            }
        }

        tasks.spawn(async move {
            let id = req.id.clone();
            let response = router.handle(req).await;
            if let Some(id) = id {
                in_flight.remove(&id);
            }
            if let Some(response) = response {
                if outgoing.send(response).await.is_err() {
                    error!("Failed to send response");
                }
            }
        });
    }
}
