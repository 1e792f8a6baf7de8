//! Anthropic-compatible completion backend
//!
//! HTTP client for an Anthropic-style `/v1/messages` endpoint as exposed by
//! local inference servers (Ollama 0.14+ and compatible). Structured output
//! is obtained by forcing the model through a single tool whose input schema
//! is the caller's output schema; the tool input comes back as the
//! completion payload.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::{CompletionOptions, LlmBackend, Message};

const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_SCHEMA_NAME: &str = "structured_output";

/// Messages API request
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

/// Tool definition carrying the forced output schema
#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ToolChoice {
    #[serde(rename = "tool")]
    Tool { name: String },
}

/// Messages API response
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse { input: serde_json::Value },
    #[serde(other)]
    Other,
}

impl MessagesResponse {
    /// Extract the first forced-tool payload
    fn schema_payload(&self) -> Option<&serde_json::Value> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { input, .. } => Some(input),
            _ => None,
        })
    }

    /// Extract joined text content
    fn text(&self) -> Option<String> {
        let texts: Vec<_> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}

/// Anthropic-compatible completion backend
#[derive(Clone)]
pub struct AnthropicBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl AnthropicBackend {
    /// Create a new backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: model.to_string(),
        }
    }

    fn build_request(&self, messages: &[Message], options: &CompletionOptions) -> MessagesRequest {
        let (tools, tool_choice) = match &options.output_schema {
            Some(schema) => {
                let name = options
                    .forced_schema_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SCHEMA_NAME.to_string());
                let tool = Tool {
                    name: name.clone(),
                    description: "Record the answer in the required shape".to_string(),
                    input_schema: schema.clone(),
                };
                (Some(vec![tool]), Some(ToolChoice::Tool { name }))
            }
            None => (None, None),
        };

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            messages: messages.to_vec(),
            system: options.system_prompt.clone(),
            tools,
            tool_choice,
        }
    }
}

#[async_trait::async_trait]
impl LlmBackend for AnthropicBackend {
    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> Result<String> {
        let request = self.build_request(messages, options);

        debug!(
            model = %self.model,
            forced_schema = request.tools.is_some(),
            "Sending completion request"
        );

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", "ollama") // ignored but required by the server
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "completion endpoint error ({}): {}",
                status, body
            )));
        }

        let messages_response: MessagesResponse = response.json().await?;

        if options.output_schema.is_some() {
            messages_response
                .schema_payload()
                .map(|payload| payload.to_string())
                .ok_or_else(|| {
                    Error::InvalidData("model returned no structured payload".to_string())
                })
        } else {
            messages_response
                .text()
                .ok_or_else(|| Error::InvalidData("no text in completion response".to_string()))
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
