use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::warn;

use weft_core::dsl::InputValue;
use weft_core::error::WeftError;
use weft_core::types::value_to_text;

/// Per-run store of node outputs, keyed by `"<node id>.<output name>"`.
///
/// One store belongs to exactly one execution.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    values: HashMap<String, Value>,
}

/// Store key for an output.
pub fn variable_key(node_id: &str, name: &str) -> String {
    format!("{node_id}.{name}")
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{([^{}]+)\}\}").unwrap())
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, node_id: &str, name: &str, value: Value) {
        self.values.insert(variable_key(node_id, name), value);
    }

    pub fn get(&self, node_id: &str, name: &str) -> Option<&Value> {
        self.values.get(&variable_key(node_id, name))
    }

    /// Look up by full key.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Substitute every `{{key}}` placeholder in one left-to-right pass.
    ///
    /// The placeholder text is used verbatim as the key. Unknown keys become
    /// the empty string; substituted text is never rescanned.
    pub fn resolve(&self, template: &str) -> String {
        placeholder_pattern()
            .replace_all(template, |caps: &Captures| {
                let key = &caps[1];
                match self.values.get(key) {
                    Some(value) => value_to_text(value),
                    None => {
                        warn!(
                            error = %WeftError::VariableNotFound(key.to_string()),
                            "Substituting empty string"
                        );
                        String::new()
                    }
                }
            })
            .into_owned()
    }

    /// Value of an input binding: literals as-is, references looked up.
    /// A reference to an unset variable yields `null`.
    pub fn resolve_value(&self, value: &InputValue) -> Value {
        match value {
            InputValue::Literal(v) => v.clone(),
            InputValue::Ref(r) => match self.get(&r.node_id, &r.name) {
                Some(v) => v.clone(),
                None => {
                    let missing = WeftError::VariableNotFound(variable_key(&r.node_id, &r.name));
                    warn!(error = %missing, "Reference resolves to null");
                    Value::Null
                }
            },
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Sorted copy of every binding.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
