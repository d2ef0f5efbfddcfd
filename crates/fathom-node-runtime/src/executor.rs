use std::future::Future;

use async_trait::async_trait;
use fathom_workflow::Node;
use tokio_util::sync::CancellationToken;

use crate::context::ExecutionContext;
use crate::error::{NodeError, ProviderError};
use crate::output::NodeOutput;

/// Executes one node type.
///
/// A single instance is registered per type tag and shared across every run,
/// so implementations hold no per-run state.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
  /// Run the node against a snapshot of the execution context.
  ///
  /// Implementations resolve their templated fields through the context and
  /// return [`NodeError::Cancelled`] if `cancel` fires while they wait.
  async fn execute(
    &self,
    node: &Node,
    context: &ExecutionContext,
    cancel: &CancellationToken,
  ) -> Result<NodeOutput, NodeError>;

  /// Check the node's configuration before any run starts.
  ///
  /// Returns every problem found, as human-readable messages.
  fn validate(&self, node: &Node) -> Result<(), Vec<String>>;
}

/// Await a provider call, giving up with [`NodeError::Cancelled`] when the
/// token fires first.
pub async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, NodeError>
where
  F: Future<Output = Result<T, ProviderError>>,
{
  tokio::select! {
    result = call => result.map_err(NodeError::from),
    _ = cancel.cancelled() => Err(NodeError::Cancelled),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_cancellable_returns_result() {
    let cancel = CancellationToken::new();
    let value = cancellable(&cancel, async { Ok::<_, ProviderError>(7) })
      .await
      .unwrap();
    assert_eq!(value, 7);
  }

  #[tokio::test]
  async fn test_cancellable_observes_token() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = cancellable(&cancel, async {
      tokio::time::sleep(Duration::from_secs(60)).await;
      Ok::<_, ProviderError>(())
    })
    .await;

    assert!(matches!(result, Err(NodeError::Cancelled)));
  }
}
