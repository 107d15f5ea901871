use chrono::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ASSISTANT_ROLE, CHAT_COMPLETION_CHUNK_OBJECT, CHAT_COMPLETION_OBJECT, MOCK_COMPLETE_MESSAGE,
    MOCK_COMPLETION_ID, MOCK_COMPLETION_TOKENS, MOCK_MODEL, MOCK_PROMPT_TOKENS, STOP_REASON,
};

/// Incoming request envelope. Only `stream` drives behavior; everything
/// else is accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionsRequest {
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub messages: serde_json::Value,
    #[serde(default)]
    pub model: serde_json::Value,
}

impl ChatCompletionsRequest {
    /// Number of conversation messages, zero when `messages` is absent or not an array.
    pub fn message_count(&self) -> usize {
        self.messages.as_array().map_or(0, Vec::len)
    }

    /// The requested model name, when one was given as a string.
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_str()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatCompletionChunkChoice>,
}

pub struct ChatCompletionChunkBuilder {
    chunk: ChatCompletionChunk,
}

impl Default for ChatCompletionChunkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatCompletionChunkBuilder {
    pub fn new() -> Self {
        ChatCompletionChunkBuilder {
            chunk: ChatCompletionChunk {
                id: MOCK_COMPLETION_ID.to_string(),
                object: CHAT_COMPLETION_CHUNK_OBJECT.to_string(),
                created: Utc::now().timestamp(),
                model: MOCK_MODEL.to_string(),
                choices: Vec::new(),
            },
        }
    }

    pub fn created(mut self, created: i64) -> Self {
        self.chunk.created = created;
        self
    }

    pub fn choices(mut self, choices: Vec<ChatCompletionChunkChoice>) -> Self {
        self.chunk.choices = choices;
        self
    }

    pub fn build(self) -> ChatCompletionChunk {
        self.chunk
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatCompletionChunkChoice {
    pub index: u32,
    pub delta: ChatCompletionChunkChoiceDelta,
    pub finish_reason: Option<String>,
}

impl ChatCompletionChunkChoice {
    pub fn content(content: impl Into<String>) -> Self {
        ChatCompletionChunkChoice {
            index: 0,
            delta: ChatCompletionChunkChoiceDelta::Content {
                content: content.into(),
            },
            finish_reason: None,
        }
    }

    /// Terminal choice: empty delta, `finish_reason: "stop"`.
    pub fn stop() -> Self {
        ChatCompletionChunkChoice {
            index: 0,
            delta: ChatCompletionChunkChoiceDelta::Empty {},
            finish_reason: Some(STOP_REASON.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum ChatCompletionChunkChoiceDelta {
    Content { content: String },
    Empty {},
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    pub usage: Usage,
}

impl ChatCompletion {
    /// The fixed non-streaming reply.
    pub fn mock() -> Self {
        ChatCompletion {
            id: MOCK_COMPLETION_ID.to_string(),
            object: CHAT_COMPLETION_OBJECT.to_string(),
            created: Utc::now().timestamp(),
            model: MOCK_MODEL.to_string(),
            choices: vec![ChatCompletionChoice {
                index: 0,
                message: ChatMessage {
                    role: ASSISTANT_ROLE.to_string(),
                    content: MOCK_COMPLETE_MESSAGE.to_string(),
                },
                finish_reason: STOP_REASON.to_string(),
            }],
            usage: Usage::new(MOCK_PROMPT_TOKENS, MOCK_COMPLETION_TOKENS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_chunk_matches_openai_shape() {
        let chunk = ChatCompletionChunkBuilder::new()
            .created(1_700_000_000)
            .choices(vec![ChatCompletionChunkChoice::content("Hello! ")])
            .build();

        assert_eq!(
            serde_json::to_value(&chunk).unwrap(),
            json!({
                "id": "chatcmpl-123",
                "object": "chat.completion.chunk",
                "created": 1_700_000_000,
                "model": "gpt-4",
                "choices": [{
                    "index": 0,
                    "delta": {"content": "Hello! "},
                    "finish_reason": null
                }]
            })
        );
    }

    #[test]
    fn stop_chunk_has_empty_delta() {
        let chunk = ChatCompletionChunkBuilder::new()
            .choices(vec![ChatCompletionChunkChoice::stop()])
            .build();
        let value = serde_json::to_value(&chunk).unwrap();

        assert_eq!(value["choices"][0]["delta"], json!({}));
        assert_eq!(value["choices"][0]["finish_reason"], "stop");
    }

    #[test]
    fn mock_completion_usage_adds_up() {
        let completion = ChatCompletion::mock();

        assert_eq!(completion.usage, Usage::new(10, 12));
        assert_eq!(completion.usage.total_tokens, 22);
        assert_eq!(completion.choices[0].message.role, "assistant");
        assert_eq!(completion.choices[0].finish_reason, "stop");
    }

    #[test]
    fn request_defaults_to_non_streaming() {
        let request: ChatCompletionsRequest =
            serde_json::from_value(json!({"messages": [{"role": "user", "content": "hi"}]}))
                .unwrap();
        assert!(!request.stream);
        assert_eq!(request.message_count(), 1);
        assert!(request.model_name().is_none());
    }

    #[test]
    fn request_ignores_unknown_fields() {
        let request: ChatCompletionsRequest = serde_json::from_value(json!({
            "stream": true,
            "model": "anything",
            "temperature": 0.2
        }))
        .unwrap();
        assert!(request.stream);
        assert_eq!(request.message_count(), 0);
        assert_eq!(request.model_name(), Some("anything"));
    }

    #[test]
    fn request_accepts_non_string_model() {
        let request: ChatCompletionsRequest =
            serde_json::from_value(json!({"stream": true, "messages": [], "model": 5})).unwrap();
        assert!(request.stream);
        assert!(request.model_name().is_none());
    }

    #[test]
    fn request_accepts_null_or_non_array_messages() {
        let request: ChatCompletionsRequest =
            serde_json::from_value(json!({"stream": false, "messages": null})).unwrap();
        assert!(!request.stream);
        assert_eq!(request.message_count(), 0);

        let request: ChatCompletionsRequest =
            serde_json::from_value(json!({"messages": "hello", "model": null})).unwrap();
        assert_eq!(request.message_count(), 0);
        assert!(request.model_name().is_none());
    }
}
