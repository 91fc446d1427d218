use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of one workflow execution.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message as the model service expects it: `{"role", "content"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One chat call: model domain, sampling parameters and the message list.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub domain: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

/// A remote tool invocation handed to a [`PluginInvoker`](crate::traits::PluginInvoker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginCall {
    pub tool_id: String,
    pub operation_id: String,
    pub parameters: serde_json::Value,
}

/// Render a JSON value the way templates and text dumps show it:
/// strings verbatim, `null` as empty, everything else as compact JSON.
pub fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Numeric view of a value; numeric strings are accepted.
pub fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integer view of a value; numeric strings and integral floats are accepted.
pub fn value_as_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("hello")), "hello");
        assert_eq!(value_to_text(&json!(null)), "");
        assert_eq!(value_to_text(&json!(3)), "3");
        assert_eq!(value_to_text(&json!(true)), "true");
        assert_eq!(value_to_text(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(value_as_i64(&json!("50")), Some(50));
        assert_eq!(value_as_i64(&json!(2048.0)), Some(2048));
        assert_eq!(value_as_i64(&json!(0.5)), None);
        assert_eq!(value_as_f64(&json!("0.7")), Some(0.7));
        assert_eq!(value_as_f64(&json!(true)), None);
    }

    #[test]
    fn test_chat_message_serialization() {
        let msg = ChatMessage::user("hi");
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_run_id_serde() {
        let id = RunId::new();
        let v = serde_json::to_value(id).unwrap();
        assert_eq!(v, json!(id.to_string()));
        let back: RunId = serde_json::from_value(v).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_plugin_call_serialization() {
        let call = PluginCall {
            tool_id: "tool@1".into(),
            operation_id: "op".into(),
            parameters: json!({"text": "x"}),
        };
        let v = serde_json::to_value(&call).unwrap();
        assert_eq!(v["toolId"], "tool@1");
        assert_eq!(v["operationId"], "op");
    }
}
