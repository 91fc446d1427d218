//! Sample workflow documents.

use serde_json::json;

use weft_core::dsl::{Edge, InputValue, Node, WorkflowDsl};

pub const START: &str = "node-start::001";
pub const LLM: &str = "node-llm::002";
pub const PLUGIN: &str = "node-plugin::003";
pub const END: &str = "node-end::004";

pub const VOICE_TOOL: &str = "tool@8b2262bef821000";

/// start → llm → plugin → end: writes a short podcast script from
/// `user_input`, synthesises it, and reports both.
pub fn podcast() -> WorkflowDsl {
    WorkflowDsl {
        nodes: vec![
            Node::new(START)
                .with_meta("node-start", "Start")
                .with_output("user_input"),
            Node::new(LLM)
                .with_meta("node-llm", "Script writer")
                .with_input("input", InputValue::reference(START, "user_input"))
                .with_param("domain", json!("generalv3.5"))
                .with_param("temperature", json!(0.7))
                .with_param("maxTokens", json!(1024))
                .with_param("prompt", json!("Write a podcast intro about {{node-start::001.user_input}}"))
                .with_output("output"),
            Node::new(PLUGIN)
                .with_meta("node-plugin", "Voice")
                .with_input("text", InputValue::reference(LLM, "output"))
                .with_input("vcn", InputValue::literal("x5_lingfeiyi_flow"))
                .with_input("speed", InputValue::literal(50))
                .with_param("pluginId", json!(VOICE_TOOL))
                .with_param("operationId", json!("synth-46EXFdLW"))
                .with_output("voice_url"),
            Node::new(END)
                .with_meta("node-end", "End")
                .with_input("script", InputValue::reference(LLM, "output"))
                .with_input("audio", InputValue::reference(PLUGIN, "voice_url"))
                .with_param("outputMode", json!(1))
                .with_param(
                    "template",
                    json!("Script: {{node-llm::002.output}}\nAudio: {{node-plugin::003.voice_url}}"),
                ),
        ],
        edges: vec![
            Edge::new(START, LLM),
            Edge::new(LLM, PLUGIN),
            Edge::new(PLUGIN, END),
        ],
    }
}

/// start → llm → end with literal-only wiring.
pub fn literal_chain() -> WorkflowDsl {
    WorkflowDsl {
        nodes: vec![
            Node::new(START),
            Node::new(LLM)
                .with_param("prompt", json!("Say hi to {{node-start::001.name}}"))
                .with_output("output"),
            Node::new(END).with_param("template", json!("<{{node-llm::002.output}}>")),
        ],
        edges: vec![Edge::new(START, LLM), Edge::new(LLM, END)],
    }
}

/// start → llm-a → llm-b → llm-a (cycle back).
pub fn cyclic() -> WorkflowDsl {
    WorkflowDsl {
        nodes: vec![
            Node::new(START),
            Node::new("node-llm::a").with_param("prompt", json!("a")),
            Node::new("node-llm::b").with_param("prompt", json!("b")),
        ],
        edges: vec![
            Edge::new(START, "node-llm::a"),
            Edge::new("node-llm::a", "node-llm::b"),
            Edge::new("node-llm::b", "node-llm::a"),
        ],
    }
}

/// start fans out to end (first edge) and llm (second edge).
pub fn branching() -> WorkflowDsl {
    WorkflowDsl {
        nodes: vec![
            Node::new(START),
            Node::new(LLM).with_param("prompt", json!("never runs")),
            Node::new(END).with_param("outputMode", json!(0)),
        ],
        edges: vec![Edge::new(START, END), Edge::new(START, LLM)],
    }
}
