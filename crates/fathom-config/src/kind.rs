use std::fmt;

use serde::{Deserialize, Serialize};

/// Built-in node type tags.
///
/// Node definitions keep their tag as a plain string so custom executors can
/// be registered under new tags; this enum covers the tags the engine ships
/// executors for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
  Trigger,
  Llm,
  Rag,
  KnowledgeBase,
  WebSearch,
  Function,
  Conditional,
  #[serde(rename = "lancedb")]
  LanceDb,
  Output,
}

impl NodeKind {
  pub const ALL: [NodeKind; 9] = [
    NodeKind::Trigger,
    NodeKind::Llm,
    NodeKind::Rag,
    NodeKind::KnowledgeBase,
    NodeKind::WebSearch,
    NodeKind::Function,
    NodeKind::Conditional,
    NodeKind::LanceDb,
    NodeKind::Output,
  ];

  /// The tag used in workflow JSON.
  pub fn as_str(&self) -> &'static str {
    match self {
      NodeKind::Trigger => "trigger",
      NodeKind::Llm => "llm",
      NodeKind::Rag => "rag",
      NodeKind::KnowledgeBase => "knowledge-base",
      NodeKind::WebSearch => "web-search",
      NodeKind::Function => "function",
      NodeKind::Conditional => "conditional",
      NodeKind::LanceDb => "lancedb",
      NodeKind::Output => "output",
    }
  }

  /// Look up a built-in kind by its tag.
  pub fn from_tag(tag: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
  }
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tags_round_trip() {
    for kind in NodeKind::ALL {
      assert_eq!(NodeKind::from_tag(kind.as_str()), Some(kind));
      let json = serde_json::to_value(kind).unwrap();
      assert_eq!(json, kind.as_str());
    }
  }

  #[test]
  fn test_unknown_tag() {
    assert_eq!(NodeKind::from_tag("sql"), None);
  }
}
