use serde::{Deserialize, Serialize};

/// Canvas coordinates. Only the editor cares about these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  #[serde(rename = "type")]
  pub node_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub position: Option<Position>,
  /// Configuration for the node type. Parsed into a
  /// [`NodeConfig`](crate::NodeConfig) during resolution.
  #[serde(default)]
  pub data: serde_json::Value,
}

impl NodeDef {
  pub fn new(id: impl Into<String>, node_type: impl Into<String>, data: serde_json::Value) -> Self {
    Self {
      id: id.into(),
      node_type: node_type.into(),
      position: None,
      data,
    }
  }
}
