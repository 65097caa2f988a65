//! Pass-through user attributes returned alongside scores.

use serde::{Deserialize, Serialize};
use super::{Node, NodeId, Value};

/// Descriptive user attributes. None of these feed the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
}

impl UserProfile {
    pub fn from_node(node: &Node) -> Self {
        let text = |key: &str| node.get(key).and_then(Value::as_str).map(str::to_owned);
        Self {
            id: node.id.clone(),
            name: text("name"),
            gender: text("gender"),
            age: node.get("age").and_then(Value::as_int),
            orientation: text("orientation"),
        }
    }
}
