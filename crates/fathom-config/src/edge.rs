use serde::{Deserialize, Serialize};

/// A directed connection between two nodes.
///
/// `source_handle` tags the outgoing port of the source node. Conditional
/// nodes use `"true"` and `"false"` to mark which branch the edge belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDef {
  pub id: String,
  pub source: String,
  pub target: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_handle: Option<String>,
}

impl EdgeDef {
  /// Create an untagged edge with an id derived from its endpoints.
  pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
    let source = source.into();
    let target = target.into();
    Self {
      id: format!("{}->{}", source, target),
      source,
      target,
      source_handle: None,
    }
  }

  /// Tag the edge with a source handle.
  pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
    let handle = handle.into();
    self.id = format!("{}:{}->{}", self.source, handle, self.target);
    self.source_handle = Some(handle);
    self
  }
}
