//! Language model access
//!
//! The rest of the crate talks to a model through the [`ChatModel`] trait so
//! structured extraction can be exercised without a live provider.
//! [`OpenAiChatModel`] is the production implementation.

pub mod openai;
pub mod schema;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, TravelAssistantError};

pub use openai::OpenAiChatModel;
pub use schema::FunctionSpec;

/// Message role
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A message in the prompt
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// One model invocation
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// When set, the model must answer by calling exactly this function
    pub function: Option<FunctionSpec>,
}

impl ChatRequest {
    /// Build the system + user prompt pair used by every call in this crate
    #[must_use]
    pub fn prompt(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            function: None,
        }
    }

    /// Builder: bind a function as the only acceptable output
    #[must_use]
    pub fn with_function(mut self, function: FunctionSpec) -> Self {
        self.function = Some(function);
        self
    }
}

/// A function call returned by the model, arguments still JSON-encoded
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// The model's answer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub function_call: Option<FunctionCall>,
}

impl ChatCompletion {
    /// Decode the arguments of the bound function call.
    ///
    /// Fails with `MalformedResponse` when there is no call, the call names a
    /// different function, or the arguments are not a JSON object.
    pub fn function_arguments(&self, expected: &str) -> Result<Value> {
        let call = self.function_call.as_ref().ok_or_else(|| {
            TravelAssistantError::malformed(format!("model did not call function '{expected}'"))
        })?;
        if call.name != expected {
            return Err(TravelAssistantError::malformed(format!(
                "model called '{}' instead of '{expected}'",
                call.name
            )));
        }
        let value: Value = serde_json::from_str(&call.arguments).map_err(|e| {
            TravelAssistantError::malformed(format!("function arguments are not JSON: {e}"))
        })?;
        if !value.is_object() {
            return Err(TravelAssistantError::malformed(
                "function arguments are not a JSON object",
            ));
        }
        Ok(value)
    }

    /// Plain text answer, trimmed
    pub fn text(&self) -> Result<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| TravelAssistantError::malformed("model returned no text"))
    }
}

/// Something that can answer chat prompts
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(name: &str, arguments: &str) -> ChatCompletion {
        ChatCompletion {
            content: None,
            function_call: Some(FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            }),
        }
    }

    #[test]
    fn test_function_arguments_decoded() {
        let value = completion("Location", r#"{"location": "Paris"}"#)
            .function_arguments("Location")
            .unwrap();
        assert_eq!(value["location"], "Paris");
    }

    #[test]
    fn test_function_arguments_wrong_function() {
        let err = completion("Other", "{}")
            .function_arguments("Location")
            .unwrap_err();
        assert!(matches!(err, TravelAssistantError::MalformedResponse { .. }));
    }

    #[test]
    fn test_function_arguments_not_json() {
        let err = completion("Location", "{location: Paris")
            .function_arguments("Location")
            .unwrap_err();
        assert!(matches!(err, TravelAssistantError::MalformedResponse { .. }));

        let err = completion("Location", "[1, 2]")
            .function_arguments("Location")
            .unwrap_err();
        assert!(matches!(err, TravelAssistantError::MalformedResponse { .. }));
    }

    #[test]
    fn test_missing_function_call() {
        let err = ChatCompletion::default()
            .function_arguments("Location")
            .unwrap_err();
        assert!(matches!(err, TravelAssistantError::MalformedResponse { .. }));
    }

    #[test]
    fn test_text_requires_content() {
        let completion = ChatCompletion {
            content: Some("  Louvre\nEiffel Tower \n".to_string()),
            function_call: None,
        };
        assert_eq!(completion.text().unwrap(), "Louvre\nEiffel Tower");
        assert!(ChatCompletion::default().text().is_err());
    }

    #[test]
    fn test_prompt_pair() {
        let request = ChatRequest::prompt("system text", "user text");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].content, "user text");
        assert!(request.function.is_none());
    }
}
