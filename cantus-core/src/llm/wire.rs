//! Wire types for the chat-completion and models-listing backends.
//!
//! The payload shape varies across OpenAI-compatible servers: `choices[0]`
//! may carry `message.content` or a legacy `text` field, and the content
//! value may be one string or an ordered list of typed parts. Everything is
//! decoded here, once, into a plain `String` — internal stages never
//! re-inspect the wire shape.

use serde::{Deserialize, Serialize};

use crate::error::{CantusError, Result};

/// One chat message in a request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Chat-completion request body.
///
/// Both `repeat_penalty` and `repetition_penalty` spellings are sent so the
/// same request works against llama.cpp-style and vLLM-style servers.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub repeat_penalty: f32,
    pub repetition_penalty: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

/// Chat-completion response body.
#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<AssistantMessage>,
    /// Legacy completions-style payload.
    #[serde(default)]
    pub text: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<MessageContent>,
}

/// A content value: one string, or an ordered list of typed parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One fragment of a multi-part content value. Servers emit either
/// `{"type": "text", "text": "..."}` objects (some use `content` for the
/// payload key) or bare strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Plain(String),
    Typed {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },
}

impl MessageContent {
    /// Flatten into a single string, concatenating parts in order.
    pub fn flatten(self) -> String {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => {
                parts.into_iter().map(ContentPart::into_text).collect()
            }
        }
    }
}

impl ContentPart {
    fn into_text(self) -> String {
        match self {
            ContentPart::Plain(text) => text,
            ContentPart::Typed { text, content } => text.or(content).unwrap_or_default(),
        }
    }
}

impl ChatCompletion {
    /// Extract the first choice's flattened text payload.
    ///
    /// # Errors
    /// `CantusError::MalformedResponse` when there are no choices or the
    /// first choice exposes neither `message.content` nor `text`.
    pub fn into_text(self) -> Result<String> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CantusError::MalformedResponse("response has no choices".into()))?;
        let content = match (choice.message, choice.text) {
            (Some(message), _) => message.content.ok_or_else(|| {
                CantusError::MalformedResponse("choice message has no content".into())
            })?,
            (None, Some(text)) => text,
            (None, None) => {
                return Err(CantusError::MalformedResponse(
                    "choice has neither message nor text".into(),
                ))
            }
        };
        Ok(content.flatten())
    }
}

/// Models-listing response body. Servers use `data` or `models` for the
/// array, and `id`/`model`/`name` for the identifier.
#[derive(Debug, Deserialize)]
pub struct ModelList {
    #[serde(default, alias = "models")]
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ModelEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ModelList {
    /// Identifiers in listing order, skipping entries with no usable field.
    pub fn ids(self) -> Vec<String> {
        self.data
            .into_iter()
            .filter_map(|entry| entry.id.or(entry.model).or(entry.name))
            .collect()
    }
}
