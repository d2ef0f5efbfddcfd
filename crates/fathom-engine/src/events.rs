//! Run lifecycle events.
//!
//! The engine reports each transition to an [`ExecutionNotifier`]. Events
//! serialize as `{"event": "node_completed", ...}` so they can be streamed to
//! a canvas as-is.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  WorkflowStarted {
    execution_id: String,
    workflow_id: String,
  },
  NodeStarted {
    execution_id: String,
    node_id: String,
    node_type: String,
  },
  /// `data` is the node's serialized output.
  NodeCompleted {
    execution_id: String,
    node_id: String,
    data: Value,
  },
  /// Every incoming edge of the node is dead.
  NodeSkipped {
    execution_id: String,
    node_id: String,
  },
  NodeFailed {
    execution_id: String,
    node_id: String,
    error: String,
  },
  WorkflowCompleted {
    execution_id: String,
  },
  WorkflowFailed {
    execution_id: String,
    error: String,
  },
}

impl ExecutionEvent {
  pub fn execution_id(&self) -> &str {
    match self {
      ExecutionEvent::WorkflowStarted { execution_id, .. }
      | ExecutionEvent::NodeStarted { execution_id, .. }
      | ExecutionEvent::NodeCompleted { execution_id, .. }
      | ExecutionEvent::NodeSkipped { execution_id, .. }
      | ExecutionEvent::NodeFailed { execution_id, .. }
      | ExecutionEvent::WorkflowCompleted { execution_id }
      | ExecutionEvent::WorkflowFailed { execution_id, .. } => execution_id,
    }
  }

  /// The node the event concerns, if any.
  pub fn node_id(&self) -> Option<&str> {
    match self {
      ExecutionEvent::NodeStarted { node_id, .. }
      | ExecutionEvent::NodeCompleted { node_id, .. }
      | ExecutionEvent::NodeSkipped { node_id, .. }
      | ExecutionEvent::NodeFailed { node_id, .. } => Some(node_id),
      _ => None,
    }
  }
}

/// Receives lifecycle events. Called inline by the scheduler, so
/// implementations must not block.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// A notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self { sender }, receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // A dropped receiver just means nobody is listening.
    let _ = self.sender.send(event);
  }
}
