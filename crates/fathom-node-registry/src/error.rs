use thiserror::Error;

/// Lookup of a type tag nothing is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown node type '{node_type}'")]
pub struct UnknownNodeTypeError {
  pub node_type: String,
}
