use std::collections::BTreeMap;
use std::path::Path;

use fathom_config::WorkflowDef;
use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::error::TemplateError;

const BUILTIN: [(&str, &str); 4] = [
  ("rag-qa.json", include_str!("../templates/rag-qa.json")),
  ("web-research.json", include_str!("../templates/web-research.json")),
  ("hybrid-research.json", include_str!("../templates/hybrid-research.json")),
  ("triage-router.json", include_str!("../templates/triage-router.json")),
];

/// Metadata key recording which template a workflow was created from.
const TEMPLATE_ID_KEY: &str = "templateId";

/// A row in the template listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
  pub id: String,
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  pub node_count: usize,
}

impl From<&WorkflowDef> for TemplateSummary {
  fn from(def: &WorkflowDef) -> Self {
    Self {
      id: def.id.clone(),
      name: def.name.clone(),
      description: def.description.clone(),
      category: def
        .metadata
        .get("category")
        .and_then(Value::as_str)
        .map(str::to_string),
      node_count: def.nodes.len(),
    }
  }
}

/// Templates keyed by id.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
  templates: BTreeMap<String, WorkflowDef>,
}

impl TemplateStore {
  /// An empty store.
  pub fn new() -> Self {
    Self::default()
  }

  /// The templates shipped with fathom.
  pub fn builtin() -> Result<Self, TemplateError> {
    let mut store = Self::new();
    for (name, content) in BUILTIN {
      store.insert(parse(name, content)?);
    }
    Ok(store)
  }

  /// Load every `*.json` file in `dir`. Templates replace existing ones with
  /// the same id. Returns the number loaded.
  pub async fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, TemplateError> {
    let dir = dir.as_ref();
    let io_error = |source| TemplateError::Io {
      path: dir.to_path_buf(),
      source,
    };

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(dir).await.map_err(io_error)?;
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
      let path = entry.path();
      if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
        paths.push(path);
      }
    }
    paths.sort();

    for path in &paths {
      let content = fs::read_to_string(path)
        .await
        .map_err(|source| TemplateError::Io {
          path: path.clone(),
          source,
        })?;
      let def = parse(&path.display().to_string(), &content)?;
      debug!(template_id = %def.id, path = %path.display(), "template_loaded");
      self.insert(def);
    }

    Ok(paths.len())
  }

  pub fn insert(&mut self, def: WorkflowDef) -> Option<WorkflowDef> {
    self.templates.insert(def.id.clone(), def)
  }

  /// Summaries ordered by id.
  pub fn list(&self) -> Vec<TemplateSummary> {
    self.templates.values().map(TemplateSummary::from).collect()
  }

  pub fn get(&self, id: &str) -> Option<&WorkflowDef> {
    self.templates.get(id)
  }

  pub fn len(&self) -> usize {
    self.templates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.templates.is_empty()
  }

  /// Copy a template into a new workflow with a fresh id.
  pub fn instantiate(&self, id: &str, name: Option<&str>) -> Result<WorkflowDef, TemplateError> {
    let template = self
      .get(id)
      .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;

    let mut def = template.clone();
    def.id = uuid::Uuid::new_v4().to_string();
    if let Some(name) = name {
      def.name = name.to_string();
    }
    def
      .metadata
      .insert(TEMPLATE_ID_KEY.to_string(), Value::String(id.to_string()));

    debug!(template_id = %id, workflow_id = %def.id, "template_instantiated");
    Ok(def)
  }
}

fn parse(name: &str, content: &str) -> Result<WorkflowDef, TemplateError> {
  serde_json::from_str(content).map_err(|source| TemplateError::Parse {
    name: name.to_string(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builtin_templates_parse() {
    let store = TemplateStore::builtin().unwrap();
    let ids: Vec<String> = store.list().into_iter().map(|s| s.id).collect();
    assert_eq!(
      ids,
      vec!["hybrid-research", "rag-qa", "triage-router", "web-research"]
    );

    let rag = store.list().into_iter().find(|s| s.id == "rag-qa").unwrap();
    assert_eq!(rag.category.as_deref(), Some("retrieval"));
    assert_eq!(rag.node_count, 4);
  }

  #[test]
  fn test_instantiate_assigns_fresh_id() {
    let store = TemplateStore::builtin().unwrap();

    let first = store.instantiate("rag-qa", Some("Support answers")).unwrap();
    let second = store.instantiate("rag-qa", None).unwrap();

    assert_ne!(first.id, "rag-qa");
    assert_ne!(first.id, second.id);
    assert_eq!(first.name, "Support answers");
    assert_eq!(second.name, "Knowledge base Q&A");
    assert_eq!(first.metadata[TEMPLATE_ID_KEY], "rag-qa");
    assert_eq!(first.nodes, store.get("rag-qa").unwrap().nodes);
  }

  #[test]
  fn test_instantiate_unknown_template() {
    let store = TemplateStore::new();
    assert!(matches!(
      store.instantiate("nope", None),
      Err(TemplateError::NotFound(id)) if id == "nope"
    ));
  }
}
