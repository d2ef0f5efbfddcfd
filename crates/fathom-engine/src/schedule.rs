//! Readiness bookkeeping for a single run.
//!
//! Every edge carries a state. Sources settle their outgoing edges when they
//! finish; targets become ready, skipped or blocked from the states of their
//! incoming edges.

use std::collections::{BTreeMap, HashMap};

use fathom_workflow::{Edge, Workflow};
use serde::{Deserialize, Serialize};

/// Lifecycle of a node within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
  Pending,
  /// Runnable, waiting for a free slot.
  Ready,
  Running,
  Completed,
  Failed,
  /// Pruned: no live path reaches the node.
  Skipped,
}

impl NodeState {
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      NodeState::Completed | NodeState::Failed | NodeState::Skipped
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeState {
  Pending,
  Live,
  /// Pruned by a branch decision or a skipped source.
  Dead,
  /// The source failed.
  Failed,
}

/// What the incoming edges say about a node.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
  Waiting,
  Ready,
  Skip,
  /// A consumer is reachable, or not pruned, but depends on a failed node.
  Blocked { failed: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Settled {
  Skipped(String),
  /// The failure of this node can no longer be tolerated.
  Fatal(String),
}

pub(crate) struct Schedule {
  edges: Vec<Edge>,
  edge_states: Vec<EdgeState>,
  incoming: HashMap<String, Vec<usize>>,
  outgoing: HashMap<String, Vec<usize>>,
  // Ordered so dispatch and skip order is deterministic.
  node_states: BTreeMap<String, NodeState>,
}

impl Schedule {
  pub(crate) fn new(workflow: &Workflow) -> Self {
    let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();
    let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();

    for (index, edge) in workflow.edges.iter().enumerate() {
      outgoing.entry(edge.source.clone()).or_default().push(index);
      incoming.entry(edge.target.clone()).or_default().push(index);
    }

    Self {
      edges: workflow.edges.clone(),
      edge_states: vec![EdgeState::Pending; workflow.edges.len()],
      incoming,
      outgoing,
      node_states: workflow
        .nodes
        .keys()
        .map(|id| (id.clone(), NodeState::Pending))
        .collect(),
    }
  }

  #[cfg(test)]
  pub(crate) fn state(&self, node_id: &str) -> Option<NodeState> {
    self.node_states.get(node_id).copied()
  }

  pub(crate) fn node_states(&self) -> HashMap<String, NodeState> {
    self
      .node_states
      .iter()
      .map(|(id, state)| (id.clone(), *state))
      .collect()
  }

  /// Nodes that can run now, in id order.
  pub(crate) fn ready(&mut self) -> Vec<String> {
    let ready: Vec<String> = self
      .node_states
      .iter()
      .filter(|(_, state)| matches!(state, NodeState::Pending | NodeState::Ready))
      .filter(|(id, _)| self.resolve(id) == Resolution::Ready)
      .map(|(id, _)| id.clone())
      .collect();

    for id in &ready {
      self.set(id, NodeState::Ready);
    }
    ready
  }

  pub(crate) fn start(&mut self, node_id: &str) {
    self.set(node_id, NodeState::Running);
  }

  /// Record a completion. `branch` is the realized handle of a conditional.
  pub(crate) fn complete(&mut self, node_id: &str, branch: Option<&str>) {
    self.set(node_id, NodeState::Completed);
    for index in self.outgoing_edges(node_id) {
      let live = match (branch, self.edges[index].handle.as_deref()) {
        (Some(branch), Some(handle)) => branch == handle,
        _ => true,
      };
      self.edge_states[index] = if live {
        EdgeState::Live
      } else {
        EdgeState::Dead
      };
    }
  }

  /// Record a failure. Returns false when the node has no consumers, in
  /// which case nothing downstream can absorb it.
  pub(crate) fn fail(&mut self, node_id: &str) -> bool {
    self.set(node_id, NodeState::Failed);
    let outgoing = self.outgoing_edges(node_id);
    for &index in &outgoing {
      self.edge_states[index] = EdgeState::Failed;
    }
    !outgoing.is_empty()
  }

  /// Propagate skips until nothing changes. Stops at the first consumer that
  /// makes an upstream failure fatal.
  pub(crate) fn settle(&mut self) -> Vec<Settled> {
    let mut settled = Vec::new();

    loop {
      let mut changed = false;
      let pending: Vec<String> = self
        .node_states
        .iter()
        .filter(|(_, state)| **state == NodeState::Pending)
        .map(|(id, _)| id.clone())
        .collect();

      for id in pending {
        match self.resolve(&id) {
          Resolution::Skip => {
            self.set(&id, NodeState::Skipped);
            for index in self.outgoing_edges(&id) {
              self.edge_states[index] = EdgeState::Dead;
            }
            settled.push(Settled::Skipped(id));
            changed = true;
          }
          Resolution::Blocked { failed } => {
            settled.push(Settled::Fatal(failed));
            return settled;
          }
          Resolution::Waiting | Resolution::Ready => {}
        }
      }

      if !changed {
        return settled;
      }
    }
  }

  fn resolve(&self, node_id: &str) -> Resolution {
    let Some(incoming) = self.incoming.get(node_id).filter(|e| !e.is_empty()) else {
      return Resolution::Ready;
    };

    let mut pending = false;
    let mut live = false;
    let mut dead = false;
    let mut failed = None;

    for &index in incoming {
      match self.edge_states[index] {
        EdgeState::Pending => pending = true,
        EdgeState::Live => live = true,
        EdgeState::Dead => dead = true,
        EdgeState::Failed => {
          failed.get_or_insert_with(|| self.edges[index].source.clone());
        }
      }
    }

    match failed {
      Some(failed) if live || (!pending && !dead) => Resolution::Blocked { failed },
      _ if pending => Resolution::Waiting,
      _ if live => Resolution::Ready,
      _ => Resolution::Skip,
    }
  }

  fn outgoing_edges(&self, node_id: &str) -> Vec<usize> {
    self.outgoing.get(node_id).cloned().unwrap_or_default()
  }

  fn set(&mut self, node_id: &str, state: NodeState) {
    if let Some(slot) = self.node_states.get_mut(node_id) {
      *slot = state;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use fathom_config::{NodeConfig, TriggerConfig};
  use fathom_workflow::Node;
  use serde_json::Map;

  fn workflow(ids: &[&str], edges: &[(&str, &str, Option<&str>)]) -> Workflow {
    let nodes = ids
      .iter()
      .map(|id| {
        (
          id.to_string(),
          Node {
            node_id: id.to_string(),
            node_type: "trigger".to_string(),
            config: NodeConfig::Trigger(TriggerConfig::default()),
            position: None,
          },
        )
      })
      .collect();
    let edges = edges
      .iter()
      .map(|(source, target, handle)| Edge {
        edge_id: format!("{source}->{target}"),
        source: source.to_string(),
        target: target.to_string(),
        handle: handle.map(str::to_string),
      })
      .collect();

    Workflow {
      workflow_id: "wf".to_string(),
      name: "wf".to_string(),
      description: None,
      nodes,
      edges,
      metadata: Map::new(),
    }
  }

  fn branching() -> Schedule {
    Schedule::new(&workflow(
      &["start", "check", "yes", "no", "after-no"],
      &[
        ("start", "check", None),
        ("check", "yes", Some("true")),
        ("check", "no", Some("false")),
        ("no", "after-no", None),
      ],
    ))
  }

  #[test]
  fn test_entry_nodes_are_ready_first() {
    let mut schedule = branching();
    assert_eq!(schedule.ready(), vec!["start"]);
    assert_eq!(schedule.state("start"), Some(NodeState::Ready));
  }

  #[test]
  fn test_branch_prunes_untaken_side() {
    let mut schedule = branching();
    schedule.ready();
    schedule.start("start");
    schedule.complete("start", None);
    assert_eq!(schedule.ready(), vec!["check"]);

    schedule.start("check");
    schedule.complete("check", Some("true"));
    let settled = schedule.settle();

    assert_eq!(
      settled,
      vec![
        Settled::Skipped("no".to_string()),
        Settled::Skipped("after-no".to_string())
      ]
    );
    assert_eq!(schedule.ready(), vec!["yes"]);
  }

  #[test]
  fn test_join_waits_for_pending_and_runs_on_any_live_edge() {
    let mut schedule = Schedule::new(&workflow(
      &["check", "a", "b", "merge"],
      &[
        ("check", "a", Some("true")),
        ("check", "b", Some("false")),
        ("a", "merge", None),
        ("b", "merge", None),
      ],
    ));

    schedule.ready();
    schedule.start("check");
    schedule.complete("check", Some("false"));
    schedule.settle();
    assert_eq!(schedule.ready(), vec!["b"]);

    schedule.start("b");
    schedule.complete("b", None);
    assert!(schedule.settle().is_empty());
    assert_eq!(schedule.ready(), vec!["merge"]);
  }

  #[test]
  fn test_failure_with_live_sibling_is_fatal() {
    let mut schedule = Schedule::new(&workflow(
      &["start", "a", "b", "out"],
      &[
        ("start", "a", None),
        ("start", "b", None),
        ("a", "out", None),
        ("b", "out", None),
      ],
    ));
    schedule.complete("start", None);
    assert!(schedule.fail("a"));
    assert!(schedule.settle().is_empty());

    schedule.complete("b", None);
    assert_eq!(schedule.settle(), vec![Settled::Fatal("a".to_string())]);
  }

  #[test]
  fn test_failure_feeding_only_its_consumer_is_fatal() {
    let mut schedule = Schedule::new(&workflow(&["a", "b"], &[("a", "b", None)]));
    assert!(schedule.fail("a"));
    assert_eq!(schedule.settle(), vec![Settled::Fatal("a".to_string())]);
  }

  #[test]
  fn test_failure_into_pruned_consumer_is_tolerated() {
    let mut schedule = Schedule::new(&workflow(
      &["check", "enrich", "gated"],
      &[("check", "gated", Some("true")), ("enrich", "gated", None)],
    ));
    schedule.complete("check", Some("false"));
    assert!(schedule.fail("enrich"));

    assert_eq!(schedule.settle(), vec![Settled::Skipped("gated".to_string())]);
    assert_eq!(schedule.state("enrich"), Some(NodeState::Failed));
  }

  #[test]
  fn test_leaf_failure_has_no_consumers() {
    let mut schedule = Schedule::new(&workflow(&["a"], &[]));
    assert!(!schedule.fail("a"));
  }
}
