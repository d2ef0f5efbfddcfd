use std::collections::HashMap;

use fathom_node_runtime::{ExecutionContext, NodeExecutionError};
use serde_json::Value;

use crate::schedule::NodeState;

/// Result of a complete workflow execution.
#[derive(Debug)]
pub struct ExecutionResult {
  pub execution_id: String,
  /// `{variableName: value}` of every completed output node, or the whole
  /// context when no output node completed.
  pub output: Value,
  pub context: ExecutionContext,
  pub node_states: HashMap<String, NodeState>,
  /// Failures whose consumers were all pruned.
  pub failures: Vec<NodeExecutionError>,
}

impl ExecutionResult {
  pub fn state(&self, node_id: &str) -> Option<NodeState> {
    self.node_states.get(node_id).copied()
  }
}

/// What a run had produced when it stopped early.
#[derive(Debug)]
pub struct PartialExecution {
  pub execution_id: String,
  pub context: ExecutionContext,
  pub node_states: HashMap<String, NodeState>,
}

impl PartialExecution {
  pub fn state(&self, node_id: &str) -> Option<NodeState> {
    self.node_states.get(node_id).copied()
  }
}
