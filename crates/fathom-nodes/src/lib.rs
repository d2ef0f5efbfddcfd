//! Fathom Nodes
//!
//! Built-in executors for every node type a workflow can contain, and
//! [`register_builtins`] to install them into an [`ExecutorRegistry`].
//!
//! Executors that call out to a provider are only registered when that
//! provider is configured; a workflow using an unconfigured type fails
//! validation with an unknown-type violation instead of failing mid-run.

mod conditional;
mod function;
mod knowledge_base;
mod llm;
mod output;
mod providers;
mod trigger;
mod vector_db;
mod web_search;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use fathom_config::NodeKind;
use fathom_node_registry::ExecutorRegistry;

pub use conditional::ConditionalExecutor;
pub use function::FunctionExecutor;
pub use knowledge_base::KnowledgeBaseExecutor;
pub use llm::LlmExecutor;
pub use output::OutputExecutor;
pub use providers::Providers;
pub use trigger::TriggerExecutor;
pub use vector_db::VectorDbExecutor;
pub use web_search::WebSearchExecutor;

/// Register the built-in executors.
///
/// `trigger`, `conditional`, `function` and `output` are always registered.
/// `llm`, `rag`/`knowledge-base`, `web-search` and `lancedb` are registered
/// when `providers` carries the collaborators they need.
pub fn register_builtins(registry: &mut ExecutorRegistry, providers: &Providers) {
  registry.register(NodeKind::Trigger.as_str(), Arc::new(TriggerExecutor));
  registry.register(NodeKind::Conditional.as_str(), Arc::new(ConditionalExecutor));
  registry.register(NodeKind::Output.as_str(), Arc::new(OutputExecutor));
  registry.register(
    NodeKind::Function.as_str(),
    Arc::new(FunctionExecutor::new(providers.transforms.clone())),
  );

  if let Some(llm) = &providers.llm {
    registry.register(NodeKind::Llm.as_str(), Arc::new(LlmExecutor::new(llm.clone())));
  }

  if let Some(retrieval) = &providers.retrieval {
    let executor = Arc::new(KnowledgeBaseExecutor::new(retrieval.clone()));
    registry.register(NodeKind::Rag.as_str(), executor.clone());
    registry.register(NodeKind::KnowledgeBase.as_str(), executor);
  }

  if let Some(search) = &providers.search {
    registry.register(
      NodeKind::WebSearch.as_str(),
      Arc::new(WebSearchExecutor::new(search.clone())),
    );
  }

  if let (Some(embedder), Some(store)) = (&providers.embedder, &providers.vector_store) {
    registry.register(
      NodeKind::LanceDb.as_str(),
      Arc::new(VectorDbExecutor::new(embedder.clone(), store.clone())),
    );
  }
}

/// Collect the messages for blank required string fields.
pub(crate) fn require_non_blank(issues: &mut Vec<String>, field: &str, value: &str) {
  if value.trim().is_empty() {
    issues.push(format!("'{}' is required", field));
  }
}

pub(crate) fn into_result(issues: Vec<String>) -> Result<(), Vec<String>> {
  if issues.is_empty() { Ok(()) } else { Err(issues) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{MockLlm, MockRetrieval};

  #[test]
  fn test_core_types_always_registered() {
    let mut registry = ExecutorRegistry::new();
    register_builtins(&mut registry, &Providers::default());
    assert_eq!(
      registry.node_types(),
      vec!["conditional", "function", "output", "trigger"]
    );
  }

  #[test]
  fn test_provider_backed_types_follow_configuration() {
    let providers = Providers::default()
      .with_llm(Arc::new(MockLlm::replying("hi")))
      .with_retrieval(Arc::new(MockRetrieval::default()));

    let mut registry = ExecutorRegistry::new();
    register_builtins(&mut registry, &providers);

    assert!(registry.contains("llm"));
    assert!(registry.contains("rag"));
    assert!(registry.contains("knowledge-base"));
    assert!(!registry.contains("web-search"));
    assert!(!registry.contains("lancedb"));
  }
}
