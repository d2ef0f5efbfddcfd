//! Node error types.

use fathom_variables::{ExpressionError, TemplateError};

/// Boxed error returned by user transforms.
pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by provider collaborators (LLM, retrieval, search, vector).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
  /// The request never produced a response.
  #[error("request failed: {source}")]
  Transport {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// The provider answered with a non-success status.
  #[error("provider returned status {status}: {body}")]
  Status { status: u16, body: String },

  /// The provider's response could not be understood.
  #[error("invalid provider response: {message}")]
  InvalidResponse { message: String },

  /// The request names a provider this collaborator does not serve.
  #[error("unsupported provider '{0}'")]
  Unsupported(String),
}

impl ProviderError {
  pub fn transport(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
    Self::Transport {
      source: source.into(),
    }
  }

  pub fn invalid_response(message: impl Into<String>) -> Self {
    Self::InvalidResponse {
      message: message.into(),
    }
  }
}

/// Why a node failed. Wrapped with the node's identity by the engine.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
  /// The node's configuration is unusable at run time.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  /// The executor was handed a node whose configuration belongs to another type.
  #[error("expected {expected} configuration")]
  ConfigMismatch { expected: &'static str },

  /// A template reference did not resolve under strict substitution.
  #[error(transparent)]
  Template(#[from] TemplateError),

  /// A condition or function expression failed to compile or evaluate.
  #[error(transparent)]
  Expression(#[from] ExpressionError),

  #[error("provider error: {0}")]
  Provider(#[from] ProviderError),

  /// The function node names a transform nobody registered.
  #[error("unknown transform '{0}'")]
  UnknownTransform(String),

  #[error("transform '{name}' failed: {source}")]
  Transform {
    name: String,
    #[source]
    source: TransformError,
  },

  /// The run's cancellation token fired while the node was running.
  #[error("node cancelled")]
  Cancelled,
}

/// A node failure, carrying the failing node's identity and the cause.
#[derive(Debug, thiserror::Error)]
#[error("node '{node_id}' ({node_type}) failed: {cause}")]
pub struct NodeExecutionError {
  pub node_id: String,
  pub node_type: String,
  #[source]
  pub cause: NodeError,
}

impl NodeExecutionError {
  pub fn new(node_id: impl Into<String>, node_type: impl Into<String>, cause: NodeError) -> Self {
    Self {
      node_id: node_id.into(),
      node_type: node_type.into(),
      cause,
    }
  }

  pub fn is_cancelled(&self) -> bool {
    matches!(self.cause, NodeError::Cancelled)
  }
}
