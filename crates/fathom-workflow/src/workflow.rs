use std::collections::HashMap;

use fathom_config::WorkflowDef;
use serde_json::{Map, Value};

use crate::edge::Edge;
use crate::graph::Graph;
use crate::node::Node;

/// A validated workflow ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
  pub workflow_id: String,
  pub name: String,
  pub description: Option<String>,
  pub nodes: HashMap<String, Node>,
  pub edges: Vec<Edge>,
  pub metadata: Map<String, Value>,
}

impl Workflow {
  /// Build the graph structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.nodes, &self.edges)
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&Node> {
    self.nodes.get(node_id)
  }

  /// Convert back to the serializable definition. Nodes are emitted in id
  /// order so the same workflow always serializes to the same JSON.
  pub fn to_def(&self) -> WorkflowDef {
    let mut nodes: Vec<&Node> = self.nodes.values().collect();
    nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));

    WorkflowDef {
      id: self.workflow_id.clone(),
      name: self.name.clone(),
      description: self.description.clone(),
      nodes: nodes.into_iter().map(Node::to_def).collect(),
      edges: self.edges.iter().map(Edge::to_def).collect(),
      metadata: self.metadata.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use fathom_config::{EdgeDef, NodeConfig, NodeDef};
  use serde_json::json;

  fn sample() -> Workflow {
    let defs = [
      NodeDef::new("trigger", "trigger", json!({})),
      NodeDef::new("check", "conditional", json!({ "condition": "input.count > 5" })),
      NodeDef::new("out", "output", json!({ "variableName": "answer" })),
    ];
    let nodes = defs
      .into_iter()
      .map(|def| {
        let node = Node::from_def(def).unwrap();
        (node.node_id.clone(), node)
      })
      .collect();

    Workflow {
      workflow_id: "wf".to_string(),
      name: "Sample".to_string(),
      description: None,
      nodes,
      edges: vec![
        EdgeDef::new("trigger", "check").into(),
        EdgeDef::new("check", "out").with_handle("true").into(),
      ],
      metadata: Map::new(),
    }
  }

  #[test]
  fn test_to_def_is_sorted_and_stable() {
    let workflow = sample();
    let first = serde_json::to_string(&workflow.to_def()).unwrap();
    let second = serde_json::to_string(&workflow.clone().to_def()).unwrap();
    assert_eq!(first, second);

    let ids: Vec<String> = workflow.to_def().nodes.into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["check", "out", "trigger"]);
  }

  #[test]
  fn test_to_def_preserves_handles_and_config() {
    let def = sample().to_def();
    assert_eq!(def.edges[1].source_handle.as_deref(), Some("true"));

    let check = def.nodes.iter().find(|n| n.id == "check").unwrap();
    assert_eq!(check.data["condition"], "input.count > 5");

    let reparsed = Node::from_def(check.clone()).unwrap();
    assert!(matches!(reparsed.config, NodeConfig::Conditional(_)));
  }

  #[test]
  fn test_graph_from_workflow() {
    let workflow = sample();
    let graph = workflow.graph();
    assert!(graph.incoming("trigger").is_empty());
    assert_eq!(graph.outgoing("check")[0].handle.as_deref(), Some("true"));
    assert!(workflow.get_node("out").is_some());
  }
}
