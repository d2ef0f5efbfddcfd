use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("invalid configuration for node '{node_id}' ({node_type}): {source}")]
  InvalidConfig {
    node_id: String,
    node_type: String,
    #[source]
    source: serde_json::Error,
  },
}
