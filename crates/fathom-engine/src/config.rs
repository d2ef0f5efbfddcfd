use fathom_variables::Strictness;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Configuration for the workflow engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
  /// Wall-clock budget for a whole run. `None` waits indefinitely.
  pub timeout_ms: Option<u64>,
  /// Upper bound on nodes running at once. `None` runs every ready node.
  pub max_parallel_nodes: Option<usize>,
  /// Fail a node on the first unresolved `{{path}}` instead of leaving the
  /// token verbatim.
  pub strict_templates: bool,
  /// Variables visible to every run's templates as `{{name}}`. A workflow's
  /// `metadata.variables` object overrides entries with the same name.
  #[serde(skip_serializing_if = "Map::is_empty")]
  pub variables: Map<String, Value>,
}

impl EngineConfig {
  pub fn strictness(&self) -> Strictness {
    if self.strict_templates {
      Strictness::Strict
    } else {
      Strictness::Lenient
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_partial_config_uses_defaults() {
    let config: EngineConfig = serde_json::from_value(json!({ "timeoutMs": 500 })).unwrap();
    assert_eq!(config.timeout_ms, Some(500));
    assert_eq!(config.max_parallel_nodes, None);
    assert_eq!(config.strictness(), Strictness::Lenient);
    assert!(config.variables.is_empty());
  }

  #[test]
  fn test_variables_parse() {
    let config: EngineConfig =
      serde_json::from_value(json!({ "variables": { "tenant": "acme" } })).unwrap();
    assert_eq!(config.variables["tenant"], "acme");
  }
}
