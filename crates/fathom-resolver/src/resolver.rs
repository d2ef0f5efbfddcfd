use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use fathom_config::WorkflowDef;
use fathom_node_registry::ExecutorRegistry;
use fathom_workflow::{Edge, Graph, Node, Workflow, WorkflowError};
use tracing::debug;

use crate::error::{GraphValidationError, Violation};

/// Scope key reserved for the run payload.
const RESERVED_NODE_ID: &str = "input";

/// Branch handles a conditional node can realize.
const BRANCH_HANDLES: [&str; 2] = ["true", "false"];

/// Resolver transforms a WorkflowDef into a validated Workflow.
pub trait Resolver: Send + Sync {
  /// Validate a workflow definition and build the executable workflow.
  ///
  /// Every violation is collected; the definition is rejected if any exist.
  fn resolve(&self, def: WorkflowDef) -> Result<Workflow, GraphValidationError>;
}

/// Standard resolver backed by the executor registry.
#[derive(Debug, Clone)]
pub struct StandardResolver {
  registry: Arc<ExecutorRegistry>,
}

impl StandardResolver {
  pub fn new(registry: Arc<ExecutorRegistry>) -> Self {
    Self { registry }
  }

  /// Parse nodes, rejecting duplicate and reserved ids.
  fn resolve_nodes(
    &self,
    def: &WorkflowDef,
    violations: &mut Vec<Violation>,
  ) -> (HashMap<String, Node>, HashSet<String>) {
    let mut nodes = HashMap::with_capacity(def.nodes.len());
    // Every declared id, including nodes whose config failed to parse, so
    // their edges are not reported as dangling.
    let mut declared = HashSet::with_capacity(def.nodes.len());

    for node_def in &def.nodes {
      if !declared.insert(node_def.id.clone()) {
        violations.push(Violation::DuplicateNodeId {
          node_id: node_def.id.clone(),
        });
        continue;
      }

      if node_def.id == RESERVED_NODE_ID {
        violations.push(Violation::ReservedNodeId {
          node_id: node_def.id.clone(),
        });
      }

      let executor = match self.registry.get(&node_def.node_type) {
        Ok(executor) => Some(executor),
        Err(source) => {
          violations.push(Violation::UnknownNodeType {
            node_id: node_def.id.clone(),
            source,
          });
          None
        }
      };

      let node = match Node::from_def(node_def.clone()) {
        Ok(node) => node,
        Err(WorkflowError::InvalidConfig {
          node_id,
          node_type,
          source,
        }) => {
          violations.push(Violation::InvalidConfig {
            node_id,
            node_type,
            source,
          });
          continue;
        }
      };

      if let Some(executor) = executor {
        if let Err(issues) = executor.validate(&node) {
          violations.push(Violation::ValidationFailed {
            node_id: node.node_id.clone(),
            node_type: node.node_type.clone(),
            issues,
          });
        }
      }

      nodes.insert(node.node_id.clone(), node);
    }

    (nodes, declared)
  }

  /// Keep edges whose endpoints both exist.
  fn resolve_edges(
    &self,
    def: &WorkflowDef,
    declared: &HashSet<String>,
    violations: &mut Vec<Violation>,
  ) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(def.edges.len());

    for edge_def in &def.edges {
      let mut valid = true;
      for endpoint in [&edge_def.source, &edge_def.target] {
        if !declared.contains(endpoint) {
          violations.push(Violation::InvalidEdge {
            edge_id: edge_def.id.clone(),
            node_id: endpoint.clone(),
          });
          valid = false;
        }
      }
      if valid {
        edges.push(Edge::from(edge_def.clone()));
      }
    }

    edges
  }

  /// Structural rules that need both nodes and edges.
  fn validate_structure(
    &self,
    nodes: &HashMap<String, Node>,
    edges: &[Edge],
    violations: &mut Vec<Violation>,
  ) {
    let graph = Graph::new(nodes, edges);

    let mut ids: Vec<&String> = nodes.keys().collect();
    ids.sort();
    for id in ids {
      let Some(node) = nodes.get(id) else { continue };
      if node.is_trigger() && !graph.incoming(id).is_empty() {
        violations.push(Violation::TriggerHasPredecessor {
          node_id: id.clone(),
        });
      }
    }

    for edge in edges {
      let Some(source) = nodes.get(&edge.source) else {
        continue;
      };
      if !source.is_conditional() {
        continue;
      }
      if let Some(handle) = &edge.handle {
        if !BRANCH_HANDLES.contains(&handle.as_str()) {
          violations.push(Violation::InvalidBranchHandle {
            edge_id: edge.edge_id.clone(),
            node_id: source.node_id.clone(),
            handle: handle.clone(),
          });
        }
      }
    }

    if let Some(path) = graph.find_cycle() {
      violations.push(Violation::Cycle { path });
    }
  }
}

impl Resolver for StandardResolver {
  fn resolve(&self, def: WorkflowDef) -> Result<Workflow, GraphValidationError> {
    let mut violations = Vec::new();

    if def.nodes.is_empty() {
      violations.push(Violation::Empty);
    }

    let (nodes, declared) = self.resolve_nodes(&def, &mut violations);
    let edges = self.resolve_edges(&def, &declared, &mut violations);
    self.validate_structure(&nodes, &edges, &mut violations);

    if !violations.is_empty() {
      debug!(
        workflow_id = %def.id,
        violations = violations.len(),
        "workflow_rejected"
      );
      return Err(GraphValidationError { violations });
    }

    debug!(
      workflow_id = %def.id,
      nodes = nodes.len(),
      edges = edges.len(),
      "workflow_resolved"
    );

    Ok(Workflow {
      workflow_id: def.id,
      name: def.name,
      description: def.description,
      nodes,
      edges,
      metadata: def.metadata,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use fathom_config::{EdgeDef, NodeDef};
  use fathom_nodes::{Providers, register_builtins};
  use serde_json::json;

  fn resolver() -> StandardResolver {
    let mut registry = ExecutorRegistry::new();
    register_builtins(&mut registry, &Providers::default());
    StandardResolver::new(Arc::new(registry))
  }

  fn workflow(nodes: Vec<NodeDef>, edges: Vec<EdgeDef>) -> WorkflowDef {
    WorkflowDef {
      id: "wf".to_string(),
      name: "test".to_string(),
      description: None,
      nodes,
      edges,
      metadata: Default::default(),
    }
  }

  fn trigger(id: &str) -> NodeDef {
    NodeDef::new(id, "trigger", json!({}))
  }

  fn output(id: &str) -> NodeDef {
    NodeDef::new(id, "output", json!({ "variableName": id }))
  }

  #[test]
  fn test_resolve_valid_workflow() {
    let def = workflow(
      vec![
        trigger("start"),
        NodeDef::new("check", "conditional", json!({ "condition": "input.x" })),
        output("yes"),
        output("no"),
      ],
      vec![
        EdgeDef::new("start", "check"),
        EdgeDef::new("check", "yes").with_handle("true"),
        EdgeDef::new("check", "no").with_handle("false"),
      ],
    );

    let resolved = resolver().resolve(def).unwrap();
    assert_eq!(resolved.nodes.len(), 4);
    assert_eq!(resolved.edges.len(), 3);
    assert!(resolved.graph().incoming("start").is_empty());
  }

  #[test]
  fn test_unknown_node_type_names_the_node() {
    let def = workflow(
      vec![trigger("start"), NodeDef::new("mystery-1", "teleport", json!({}))],
      vec![EdgeDef::new("start", "mystery-1")],
    );

    let err = resolver().resolve(def).unwrap_err();
    let unknown = err.unknown_node_type("mystery-1").unwrap();
    assert_eq!(unknown.node_type, "teleport");
    assert_eq!(err.violations().len(), 1);
  }

  #[test]
  fn test_provider_backed_type_without_provider_is_unknown() {
    let def = workflow(
      vec![NodeDef::new("llm-1", "llm", json!({ "prompt": "hi" }))],
      vec![],
    );
    let err = resolver().resolve(def).unwrap_err();
    assert!(err.unknown_node_type("llm-1").is_some());
  }

  #[test]
  fn test_collects_every_violation() {
    let def = workflow(
      vec![
        trigger("start"),
        trigger("start"),
        NodeDef::new("a", "function", json!({ "expression": "1" })),
        NodeDef::new("b", "function", json!({ "expression": "2" })),
        NodeDef::new("check", "conditional", json!({ "condition": "" })),
        output("input"),
      ],
      vec![
        EdgeDef::new("a", "b"),
        EdgeDef::new("b", "a"),
        EdgeDef::new("a", "ghost"),
        EdgeDef::new("a", "start"),
        EdgeDef::new("check", "input").with_handle("maybe"),
      ],
    );

    let err = resolver().resolve(def).unwrap_err();
    let violations = err.violations();

    assert!(violations
      .iter()
      .any(|v| matches!(v, Violation::DuplicateNodeId { node_id } if node_id == "start")));
    assert!(violations
      .iter()
      .any(|v| matches!(v, Violation::ReservedNodeId { node_id } if node_id == "input")));
    assert!(violations
      .iter()
      .any(|v| matches!(v, Violation::InvalidEdge { node_id, .. } if node_id == "ghost")));
    assert!(violations
      .iter()
      .any(|v| matches!(v, Violation::ValidationFailed { node_id, .. } if node_id == "check")));
    assert!(violations
      .iter()
      .any(|v| matches!(v, Violation::TriggerHasPredecessor { node_id } if node_id == "start")));
    assert!(violations
      .iter()
      .any(|v| matches!(v, Violation::InvalidBranchHandle { handle, .. } if handle == "maybe")));
    assert!(violations
      .iter()
      .any(|v| matches!(v, Violation::Cycle { path } if path == &["a", "b", "a"])));
  }

  #[test]
  fn test_invalid_config_is_reported() {
    let def = workflow(
      vec![NodeDef::new("check", "conditional", json!({ "condition": 42 }))],
      vec![],
    );

    let err = resolver().resolve(def).unwrap_err();
    assert!(matches!(
      &err.violations()[0],
      Violation::InvalidConfig { node_id, .. } if node_id == "check"
    ));
  }

  #[test]
  fn test_empty_workflow() {
    let err = resolver().resolve(workflow(vec![], vec![])).unwrap_err();
    assert!(matches!(err.violations()[0], Violation::Empty));
  }
}
