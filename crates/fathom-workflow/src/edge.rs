use fathom_config::EdgeDef;
use serde::{Deserialize, Serialize};

/// A resolved edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EdgeDef", into = "EdgeDef")]
pub struct Edge {
  pub edge_id: String,
  pub source: String,
  pub target: String,
  /// Branch handle on the source node, e.g. `"true"` or `"false"`.
  pub handle: Option<String>,
}

impl Edge {
  pub fn to_def(&self) -> EdgeDef {
    EdgeDef {
      id: self.edge_id.clone(),
      source: self.source.clone(),
      target: self.target.clone(),
      source_handle: self.handle.clone(),
    }
  }
}

impl From<EdgeDef> for Edge {
  fn from(def: EdgeDef) -> Self {
    Self {
      edge_id: def.id,
      source: def.source,
      target: def.target,
      handle: def.source_handle,
    }
  }
}

impl From<Edge> for EdgeDef {
  fn from(edge: Edge) -> Self {
    EdgeDef {
      id: edge.edge_id,
      source: edge.source,
      target: edge.target,
      source_handle: edge.handle,
    }
  }
}
