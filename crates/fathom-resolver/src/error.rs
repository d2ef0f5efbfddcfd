use fathom_node_registry::UnknownNodeTypeError;
use thiserror::Error;

/// One problem found while validating a workflow definition.
#[derive(Debug, Error)]
pub enum Violation {
  #[error("workflow has no nodes")]
  Empty,

  #[error("duplicate node id: {node_id}")]
  DuplicateNodeId { node_id: String },

  /// `input` is the scope key of the run payload.
  #[error("node id '{node_id}' is reserved")]
  ReservedNodeId { node_id: String },

  #[error("invalid edge '{edge_id}': node '{node_id}' does not exist")]
  InvalidEdge { edge_id: String, node_id: String },

  #[error("cycle detected: {}", .path.join(" -> "))]
  Cycle { path: Vec<String> },

  #[error("node '{node_id}': {source}")]
  UnknownNodeType {
    node_id: String,
    #[source]
    source: UnknownNodeTypeError,
  },

  #[error("node '{node_id}' ({node_type}) has invalid configuration: {source}")]
  InvalidConfig {
    node_id: String,
    node_type: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("node '{node_id}' ({node_type}) failed validation: {}", .issues.join("; "))]
  ValidationFailed {
    node_id: String,
    node_type: String,
    issues: Vec<String>,
  },

  #[error("trigger node '{node_id}' has incoming edges")]
  TriggerHasPredecessor { node_id: String },

  #[error("edge '{edge_id}' leaves conditional '{node_id}' with handle '{handle}' (expected 'true' or 'false')")]
  InvalidBranchHandle {
    edge_id: String,
    node_id: String,
    handle: String,
  },
}

impl Violation {
  /// The node the violation is about, when there is one.
  pub fn node_id(&self) -> Option<&str> {
    match self {
      Violation::Empty | Violation::Cycle { .. } => None,
      Violation::DuplicateNodeId { node_id }
      | Violation::ReservedNodeId { node_id }
      | Violation::InvalidEdge { node_id, .. }
      | Violation::UnknownNodeType { node_id, .. }
      | Violation::InvalidConfig { node_id, .. }
      | Violation::ValidationFailed { node_id, .. }
      | Violation::TriggerHasPredecessor { node_id }
      | Violation::InvalidBranchHandle { node_id, .. } => Some(node_id),
    }
  }
}

/// Every violation found in a workflow definition. Nothing runs while any
/// exist.
#[derive(Debug, Error)]
#[error("workflow validation failed: {}", summary(.violations))]
pub struct GraphValidationError {
  pub violations: Vec<Violation>,
}

impl GraphValidationError {
  pub fn violations(&self) -> &[Violation] {
    &self.violations
  }

  /// The unknown-type error reported for `node_id`, if any.
  pub fn unknown_node_type(&self, node_id: &str) -> Option<&UnknownNodeTypeError> {
    self.violations.iter().find_map(|v| match v {
      Violation::UnknownNodeType { node_id: id, source } if id == node_id => Some(source),
      _ => None,
    })
  }
}

fn summary(violations: &[Violation]) -> String {
  violations
    .iter()
    .map(|v| v.to_string())
    .collect::<Vec<_>>()
    .join("; ")
}
