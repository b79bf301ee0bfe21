//! LLM request/response types
//!
//! Provider-agnostic shapes for a single text completion. Providers translate
//! these into their own wire formats.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one collaborator call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from a stage template)
    pub system_prompt: String,

    /// Conversation turns; every stage sends a single user turn
    pub messages: Vec<Message>,

    /// Max tokens for the response (stage budget, capped by the client)
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// One system prompt plus one user turn
    pub fn single(system_prompt: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: vec![Message::user(user)],
            max_tokens,
        }
    }

    /// Text of the last user turn, if any
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub finish_reason: FinishReason,

    /// Token usage reported by the provider
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain text response with no usage attached
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: FinishReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    /// True when the provider cut the reply off at the token budget
    pub fn is_truncated(&self) -> bool {
        self.finish_reason == FinishReason::MaxTokens
    }

    /// Response text trimmed of surrounding whitespace; missing content is empty
    pub fn trimmed_text(&self) -> String {
        let text = self.content.as_deref().map(str::trim).unwrap_or_default().to_string();
        debug!(len = text.len(), "CompletionResponse::trimmed_text: called");
        text
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

impl FinishReason {
    /// Parse from an Anthropic `stop_reason`
    pub fn from_anthropic(s: &str) -> Self {
        match s {
            "max_tokens" => FinishReason::MaxTokens,
            "stop_sequence" => FinishReason::StopSequence,
            _ => FinishReason::EndTurn,
        }
    }

    /// Parse from an OpenAI-style `finish_reason`
    pub fn from_openai(s: Option<&str>) -> Self {
        match s {
            Some("length") => FinishReason::MaxTokens,
            Some("stop") | None => FinishReason::EndTurn,
            Some(_) => FinishReason::StopSequence,
        }
    }
}

/// Token usage for a single call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
