//! OpenAI compatible chat completions client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ChatCompletion, ChatMessage, ChatModel, ChatRequest, FunctionCall, FunctionSpec};
use crate::config::ModelConfig;
use crate::{Result, TravelAssistantError};

/// Chat completions client
#[derive(Clone)]
pub struct OpenAiChatModel {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiChatModel {
    /// Create a client with an explicit API key
    ///
    /// Fails with a configuration error when the key is blank.
    pub fn new(client: Client, api_key: impl Into<String>, config: &ModelConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TravelAssistantError::config("model API key is missing"));
        }
        Ok(Self {
            client,
            api_key,
            api_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.timeout(),
        })
    }

    /// Create a client using the key from the configuration
    pub fn from_config(client: Client, config: &ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| TravelAssistantError::config("model API key is missing"))?;
        Self::new(client, api_key, config)
    }

    fn build_body(&self, request: ChatRequest) -> wire::CompletionRequest {
        let (tools, tool_choice) = match request.function {
            Some(function) => {
                let choice = wire::ToolChoice::function(&function.name);
                (Some(vec![wire::Tool::function(function)]), Some(choice))
            }
            None => (None, None),
        };
        wire::CompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: request.messages,
            tools,
            tool_choice,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion> {
        let body = self.build_body(request);
        debug!("Sending chat completion request to {}", self.api_url);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let text = response.text().await?;
                let parsed: wire::CompletionResponse = serde_json::from_str(&text).map_err(|e| {
                    TravelAssistantError::malformed(format!("Failed to parse model response: {e}"))
                })?;
                parsed.into_completion()
            }
            StatusCode::UNAUTHORIZED => Err(TravelAssistantError::config("model API key was rejected")),
            StatusCode::TOO_MANY_REQUESTS => Err(TravelAssistantError::transport(
                "model API rate limit exceeded",
            )),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(TravelAssistantError::transport(format!(
                    "model API error {status}: {body}"
                )))
            }
        }
    }
}

/// Chat completions request and response structures
mod wire {
    use super::*;

    #[derive(Debug, Serialize)]
    pub struct CompletionRequest {
        pub model: String,
        pub temperature: f32,
        pub messages: Vec<ChatMessage>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub tools: Option<Vec<Tool>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub tool_choice: Option<ToolChoice>,
    }

    #[derive(Debug, Serialize)]
    pub struct Tool {
        #[serde(rename = "type")]
        pub kind: &'static str,
        pub function: FunctionSpec,
    }

    impl Tool {
        pub fn function(function: FunctionSpec) -> Self {
            Self {
                kind: "function",
                function,
            }
        }
    }

    #[derive(Debug, Serialize)]
    pub struct ToolChoice {
        #[serde(rename = "type")]
        pub kind: &'static str,
        pub function: ToolChoiceFunction,
    }

    #[derive(Debug, Serialize)]
    pub struct ToolChoiceFunction {
        pub name: String,
    }

    impl ToolChoice {
        pub fn function(name: &str) -> Self {
            Self {
                kind: "function",
                function: ToolChoiceFunction {
                    name: name.to_string(),
                },
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct CompletionResponse {
        #[serde(default)]
        pub choices: Vec<Choice>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Choice {
        pub message: ResponseMessage,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseMessage {
        pub content: Option<String>,
        #[serde(default)]
        pub tool_calls: Vec<ToolCall>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ToolCall {
        pub function: ToolCallFunction,
    }

    #[derive(Debug, Deserialize)]
    pub struct ToolCallFunction {
        pub name: String,
        pub arguments: String,
    }

    impl CompletionResponse {
        pub fn into_completion(self) -> Result<ChatCompletion> {
            let choice = self
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| TravelAssistantError::malformed("model response has no choices"))?;
            let function_call = choice
                .message
                .tool_calls
                .into_iter()
                .next()
                .map(|call| FunctionCall {
                    name: call.function.name,
                    arguments: call.function.arguments,
                });
            Ok(ChatCompletion {
                content: choice.message.content,
                function_call,
            })
        }
    }
}
