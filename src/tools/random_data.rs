//! `get_random_data`: fetch one todo item from a placeholder REST API.

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::mcp::handler::{error_result, get_optional_int_arg, success_result, Arguments, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::VERSION;

/// Tool name.
pub const NAME: &str = "get_random_data";

/// Smallest todo id the API serves.
pub const MIN_TODO_ID: i64 = 1;

/// Largest todo id the API serves.
pub const MAX_TODO_ID: i64 = 100;

fn user_agent() -> String {
    format!("hostinfo-mcp/{} (rust)", VERSION)
}

/// HTTP client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl TodoClient {
    /// Create a client. `timeout_secs` bounds the whole request.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout_secs,
        })
    }

    /// URL of one todo item.
    pub fn todo_url(&self, id: i64) -> String {
        format!("{}/todos/{}", self.base_url.trim_end_matches('/'), id)
    }

    /// Fetch one todo item. Single attempt, no retry.
    pub async fn fetch_todo(&self, id: i64) -> Result<Value> {
        let response = self
            .client
            .get(self.todo_url(id))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                seconds: self.timeout_secs,
            }
        } else {
            Error::Http(e)
        }
    }
}

/// Random todo tool.
pub struct RandomDataTool {
    client: TodoClient,
}

impl RandomDataTool {
    pub fn new(client: TodoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for RandomDataTool {
    fn definition(&self) -> Tool {
        Tool {
            name: NAME.to_string(),
            description: "Fetch random data from JSONPlaceholder API (todos 1-100)".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "number",
                        "description": "Todo ID between 1 and 100 (optional, random if not provided)",
                        "minimum": MIN_TODO_ID,
                        "maximum": MAX_TODO_ID
                    }
                },
                "required": []
            }),
        }
    }

    async fn execute(&self, args: Arguments) -> Result<ToolResult> {
        info!("Executing {} tool", NAME);

        let todo_id = match get_optional_int_arg(&args, "id")? {
            Some(id) if !(MIN_TODO_ID..=MAX_TODO_ID).contains(&id) => {
                return Err(Error::InvalidToolArguments(format!(
                    "id must be between {} and {}, got {}",
                    MIN_TODO_ID, MAX_TODO_ID, id
                )));
            }
            Some(id) => id,
            None => rand::thread_rng().gen_range(MIN_TODO_ID..=MAX_TODO_ID),
        };

        let url = self.client.todo_url(todo_id);
        info!("Fetching todo data for ID: {}", todo_id);

        match self.client.fetch_todo(todo_id).await {
            Ok(data) => {
                info!("{} completed successfully for ID: {}", NAME, todo_id);
                let payload = json!({
                    "message": format!("Fetched todo data for ID: {}", todo_id),
                    "data": data,
                    "api_url": url,
                });
                Ok(success_result(serde_json::to_string_pretty(&payload)?))
            }
            Err(e) => {
                warn!("{} failed: {}", NAME, e);
                Ok(error_result(format!("Error fetching data: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::ContentBlock;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args_with_id(id: Value) -> Arguments {
        let mut args = Arguments::new();
        args.insert("id".to_string(), id);
        args
    }

    fn text_of(result: &ToolResult) -> &str {
        let ContentBlock::Text { text } = &result.content[0];
        text
    }

    #[test]
    fn test_todo_url_trims_trailing_slash() {
        let client = TodoClient::new("http://localhost:1234/", 5).unwrap();
        assert_eq!(client.todo_url(7), "http://localhost:1234/todos/7");
    }

    #[test]
    fn test_definition_declares_bounds() {
        let tool = RandomDataTool::new(TodoClient::new("http://localhost", 1).unwrap());
        let def = tool.definition();
        assert_eq!(def.name, "get_random_data");
        assert_eq!(def.input_schema["properties"]["id"]["minimum"], 1);
        assert_eq!(def.input_schema["properties"]["id"]["maximum"], 100);
    }

    #[tokio::test]
    async fn test_fetch_specific_todo() {
        let server = MockServer::start().await;
        let todo = json!({"userId": 1, "id": 42, "title": "write tests", "completed": false});
        Mock::given(method("GET"))
            .and(path("/todos/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(todo.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let tool = RandomDataTool::new(TodoClient::new(server.uri(), 5).unwrap());
        let result = tool.execute(args_with_id(json!(42))).await.unwrap();

        assert!(!result.is_error);
        let payload: Value = serde_json::from_str(text_of(&result)).unwrap();
        assert_eq!(payload["data"], todo);
        assert_eq!(payload["message"], "Fetched todo data for ID: 42");
        assert_eq!(payload["api_url"], format!("{}/todos/42", server.uri()));
    }

    #[tokio::test]
    async fn test_random_id_within_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 0})))
            .mount(&server)
            .await;

        let tool = RandomDataTool::new(TodoClient::new(server.uri(), 5).unwrap());
        for _ in 0..20 {
            let result = tool.execute(Arguments::new()).await.unwrap();
            let payload: Value = serde_json::from_str(text_of(&result)).unwrap();
            let url = payload["api_url"].as_str().unwrap();
            let id: i64 = url.rsplit('/').next().unwrap().parse().unwrap();
            assert!((1..=100).contains(&id));
        }
    }

    #[tokio::test]
    async fn test_http_error_status_is_tool_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/todos/5"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tool = RandomDataTool::new(TodoClient::new(server.uri(), 5).unwrap());
        let result = tool.execute(args_with_id(json!(5))).await.unwrap();

        assert!(result.is_error);
        assert_eq!(text_of(&result), "Error fetching data: HTTP error! status: 404");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_tool_error() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let tool = RandomDataTool::new(TodoClient::new("http://127.0.0.1:9", 2).unwrap());
        let result = tool.execute(args_with_id(json!(1))).await.unwrap();

        assert!(result.is_error);
        assert!(text_of(&result).starts_with("Error fetching data:"));
    }

    #[tokio::test]
    async fn test_out_of_range_id_is_invalid_argument() {
        let tool = RandomDataTool::new(TodoClient::new("http://127.0.0.1:9", 1).unwrap());
        for bad in [json!(0), json!(101), json!(-3), json!("seven"), json!(2.5)] {
            let err = tool.execute(args_with_id(bad)).await.unwrap_err();
            assert_eq!(err.code(), -32602);
        }
    }
}
