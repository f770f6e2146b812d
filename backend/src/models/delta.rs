use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A rich-text document as a sequence of insert operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub ops: Vec<DeltaOp>,
}

/// One delta operation. Only inserts carry document content; `retain` and
/// `delete` (change deltas) are accepted and ignored when rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<Insert>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insert {
    Text(String),
    /// `{ "image": "https://…" }`, `{ "video": "…" }`, `{ "formula": "…" }`.
    Embed(Map<String, Value>),
}

impl Delta {
    /// Accepts either `{ "ops": [...] }` or a bare array of operations.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(_) => Ok(Delta {
                ops: serde_json::from_value(value.clone())?,
            }),
            _ => serde_json::from_value(value.clone()),
        }
    }

    /// True when `value` has the shape of a delta: an object with an `ops`
    /// array, or a non-empty array.
    pub fn looks_like_delta(value: &Value) -> bool {
        match value {
            Value::Object(map) => map.get("ops").is_some_and(Value::is_array),
            Value::Array(items) => !items.is_empty(),
            _ => false,
        }
    }

    /// Text of every string insert, embeds skipped.
    pub fn plain_text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match &op.insert {
                Some(Insert::Text(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
