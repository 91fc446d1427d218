//! Wire types for the chat service.

use serde::{Deserialize, Serialize};

use weft_core::types::{ChatMessage, ChatRequest};

/// `header.status` value that marks the last frame of a reply.
pub const STATUS_FINAL: i64 = 2;

const TOP_K: u32 = 4;
const AUDITING: &str = "default";
const QUESTION_TYPE: &str = "not_knowledge";

// Request types
#[derive(Debug, Serialize)]
pub struct ChatPayload {
    pub header: RequestHeader,
    pub parameter: Parameter,
    pub payload: RequestPayload,
}

#[derive(Debug, Serialize)]
pub struct RequestHeader {
    pub app_id: String,
    pub uid: String,
}

#[derive(Debug, Serialize)]
pub struct Parameter {
    pub chat: ChatParameter,
}

#[derive(Debug, Serialize)]
pub struct ChatParameter {
    pub domain: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_k: u32,
    pub auditing: String,
    pub question_type: String,
}

#[derive(Debug, Serialize)]
pub struct RequestPayload {
    pub message: MessageBlock,
}

#[derive(Debug, Serialize)]
pub struct MessageBlock {
    pub text: Vec<ChatMessage>,
}

impl ChatPayload {
    pub fn new(app_id: &str, uid: &str, request: ChatRequest) -> Self {
        Self {
            header: RequestHeader {
                app_id: app_id.to_string(),
                uid: uid.to_string(),
            },
            parameter: Parameter {
                chat: ChatParameter {
                    domain: request.domain,
                    temperature: request.temperature,
                    max_tokens: request.max_tokens,
                    top_k: TOP_K,
                    auditing: AUDITING.to_string(),
                    question_type: QUESTION_TYPE.to_string(),
                },
            },
            payload: RequestPayload {
                message: MessageBlock {
                    text: request.messages,
                },
            },
        }
    }
}

// Response types
#[derive(Debug, Deserialize)]
pub struct ResponseFrame {
    pub header: ResponseHeader,
    #[serde(default)]
    pub payload: Option<ResponsePayload>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseHeader {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub sid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePayload {
    #[serde(default)]
    pub choices: Option<Choices>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Choices {
    #[serde(default)]
    pub text: Vec<TextFragment>,
}

#[derive(Debug, Deserialize)]
pub struct TextFragment {
    #[serde(default)]
    pub content: String,
}

impl ResponseFrame {
    /// Text fragments carried by this frame, in order.
    pub fn fragments(&self) -> impl Iterator<Item = &str> {
        self.payload
            .iter()
            .filter_map(|p| p.choices.as_ref())
            .flat_map(|c| c.text.iter())
            .map(|t| t.content.as_str())
    }
}
