use fathom_config::{NodeConfig, NodeDef, NodeKind, Position};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// A resolved node in a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeDef", into = "NodeDef")]
pub struct Node {
  pub node_id: String,
  /// The type tag the node's executor is registered under.
  pub node_type: String,
  pub config: NodeConfig,
  pub position: Option<Position>,
}

impl Node {
  /// Parse a node definition's `data` into its typed configuration.
  pub fn from_def(def: NodeDef) -> Result<Self, WorkflowError> {
    let config =
      NodeConfig::parse(&def.node_type, &def.data).map_err(|e| WorkflowError::InvalidConfig {
        node_id: def.id.clone(),
        node_type: def.node_type.clone(),
        source: e,
      })?;

    Ok(Self {
      node_id: def.id,
      node_type: def.node_type,
      config,
      position: def.position,
    })
  }

  pub fn to_def(&self) -> NodeDef {
    NodeDef {
      id: self.node_id.clone(),
      node_type: self.node_type.clone(),
      position: self.position,
      data: self.config.to_value(),
    }
  }

  /// The built-in kind of this node, if its tag is one.
  pub fn kind(&self) -> Option<NodeKind> {
    NodeKind::from_tag(&self.node_type)
  }

  pub fn is_trigger(&self) -> bool {
    matches!(self.config, NodeConfig::Trigger(_))
  }

  pub fn is_conditional(&self) -> bool {
    matches!(self.config, NodeConfig::Conditional(_))
  }
}

impl TryFrom<NodeDef> for Node {
  type Error = WorkflowError;

  fn try_from(def: NodeDef) -> Result<Self, Self::Error> {
    Node::from_def(def)
  }
}

impl From<Node> for NodeDef {
  fn from(node: Node) -> Self {
    node.to_def()
  }
}
