use fathom_node_runtime::NodeExecutionError;
use fathom_resolver::GraphValidationError;
use thiserror::Error;

use crate::result::PartialExecution;

/// Errors that can occur during workflow execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
  /// The workflow was rejected before any node ran.
  #[error(transparent)]
  Validation(#[from] GraphValidationError),

  #[error("workflow failed: {error}")]
  NodeFailed {
    #[source]
    error: NodeExecutionError,
    partial: Box<PartialExecution>,
  },

  #[error("workflow execution cancelled")]
  Cancelled { partial: Box<PartialExecution> },

  #[error("workflow timed out after {timeout_ms}ms")]
  Timeout {
    timeout_ms: u64,
    partial: Box<PartialExecution>,
  },

  #[error("node '{0}' not found in workflow")]
  NodeNotFound(String),

  #[error("task for node '{node_id}' did not complete: {source}")]
  Join {
    node_id: String,
    #[source]
    source: tokio::task::JoinError,
  },
}

impl ExecutionError {
  /// Context and node states at the moment the run stopped, if it started.
  pub fn partial(&self) -> Option<&PartialExecution> {
    match self {
      ExecutionError::NodeFailed { partial, .. }
      | ExecutionError::Cancelled { partial }
      | ExecutionError::Timeout { partial, .. } => Some(&**partial),
      _ => None,
    }
  }
}
