use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fathom_node_runtime::NodeExecutor;
use tracing::debug;

use crate::error::UnknownNodeTypeError;

/// Executors keyed by node type tag.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
  executors: HashMap<String, Arc<dyn NodeExecutor>>,
}

impl ExecutorRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an executor for a type tag, returning the one it replaces.
  pub fn register(
    &mut self,
    node_type: impl Into<String>,
    executor: Arc<dyn NodeExecutor>,
  ) -> Option<Arc<dyn NodeExecutor>> {
    let node_type = node_type.into();
    debug!(node_type = %node_type, "executor_registered");
    self.executors.insert(node_type, executor)
  }

  pub fn get(&self, node_type: &str) -> Result<Arc<dyn NodeExecutor>, UnknownNodeTypeError> {
    self
      .executors
      .get(node_type)
      .cloned()
      .ok_or_else(|| UnknownNodeTypeError {
        node_type: node_type.to_string(),
      })
  }

  pub fn contains(&self, node_type: &str) -> bool {
    self.executors.contains_key(node_type)
  }

  /// Registered type tags, sorted.
  pub fn node_types(&self) -> Vec<&str> {
    let mut types: Vec<&str> = self.executors.keys().map(|s| s.as_str()).collect();
    types.sort();
    types
  }

  pub fn len(&self) -> usize {
    self.executors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.executors.is_empty()
  }
}

impl fmt::Debug for ExecutorRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExecutorRegistry")
      .field("node_types", &self.node_types())
      .finish()
  }
}
