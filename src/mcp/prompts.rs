//! MCP Prompt Templates
//!
//! Static instruction templates that point an assistant at the server's tools.
//! Templates are returned verbatim; arguments are echoed, never substituted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A prompt argument definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
}

/// A prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

/// A prompt message (the actual content).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: PromptContent,
}

/// Prompt content types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptContent {
    Text { text: String },
}

/// Result of prompts/list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPromptsResult {
    pub prompts: Vec<Prompt>,
}

/// Result of prompts/get.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPromptResult {
    pub description: Option<String>,
    /// Raw template text.
    pub prompt: String,
    /// Caller-supplied arguments, unmodified.
    pub arguments: Map<String, Value>,
    pub messages: Vec<PromptMessage>,
}

/// Prompt registry.
#[derive(Debug, Clone, Default)]
pub struct PromptRegistry {
    prompts: Vec<(Prompt, PromptTemplate)>,
}

/// Template text attached to a prompt.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub template: String,
}

impl PromptRegistry {
    /// Create a new registry with built-in prompts.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_builtin_prompts();
        registry
    }

    fn register_builtin_prompts(&mut self) {
        self.register(
            Prompt {
                name: "system_info".to_string(),
                description: "Get system information".to_string(),
                arguments: vec![PromptArgument {
                    name: "none".to_string(),
                    description: "No arguments required".to_string(),
                    kind: "string".to_string(),
                    required: false,
                }],
            },
            PromptTemplate {
                template: "You are a helpful assistant. The user wants to get system information. \
Use the get_system_info tool to retrieve current system details and present them in a clear, organized format."
                    .to_string(),
            },
        );

        self.register(
            Prompt {
                name: "get_random_data".to_string(),
                description: "Fetch random todo data from JSONPlaceholder API".to_string(),
                arguments: vec![PromptArgument {
                    name: "id".to_string(),
                    description: "Optional todo ID (1-100), random if not provided".to_string(),
                    kind: "number".to_string(),
                    required: false,
                }],
            },
            PromptTemplate {
                template: "You are a helpful assistant. The user wants to fetch random todo data from the JSONPlaceholder API. \
Use the get_random_data tool to retrieve todo data. You can optionally specify an ID between 1-100, \
or let it fetch a random todo. Present the data in a clear, organized format showing the todo details."
                    .to_string(),
            },
        );
    }

    /// Register a prompt, replacing any prompt of the same name in place.
    pub fn register(&mut self, prompt: Prompt, template: PromptTemplate) {
        match self.prompts.iter_mut().find(|(p, _)| p.name == prompt.name) {
            Some(slot) => *slot = (prompt, template),
            None => self.prompts.push((prompt, template)),
        }
    }

    /// List all prompts in registration order.
    pub fn list(&self) -> Vec<Prompt> {
        self.prompts.iter().map(|(p, _)| p.clone()).collect()
    }

    /// Get a prompt by name, echoing the arguments back.
    pub fn get(&self, name: &str, arguments: Map<String, Value>) -> Option<GetPromptResult> {
        self.prompts
            .iter()
            .find(|(p, _)| p.name == name)
            .map(|(prompt, template)| GetPromptResult {
                description: Some(prompt.description.clone()),
                prompt: template.template.clone(),
                arguments,
                messages: vec![PromptMessage {
                    role: "user".to_string(),
                    content: PromptContent::Text {
                        text: template.template.clone(),
                    },
                }],
            })
    }
}
