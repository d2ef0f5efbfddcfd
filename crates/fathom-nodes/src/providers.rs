use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fathom_node_runtime::{
  Embedder, LlmProvider, RetrievalProvider, SearchProvider, UserTransform, VectorStore,
};

/// The collaborators built-in executors call out to.
#[derive(Clone, Default)]
pub struct Providers {
  pub llm: Option<Arc<dyn LlmProvider>>,
  pub retrieval: Option<Arc<dyn RetrievalProvider>>,
  pub search: Option<Arc<dyn SearchProvider>>,
  pub embedder: Option<Arc<dyn Embedder>>,
  pub vector_store: Option<Arc<dyn VectorStore>>,
  /// Transforms the `function` node can call by name.
  pub transforms: HashMap<String, Arc<dyn UserTransform>>,
}

impl Providers {
  pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
    self.llm = Some(llm);
    self
  }

  pub fn with_retrieval(mut self, retrieval: Arc<dyn RetrievalProvider>) -> Self {
    self.retrieval = Some(retrieval);
    self
  }

  pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
    self.search = Some(search);
    self
  }

  pub fn with_vector_store(
    mut self,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
  ) -> Self {
    self.embedder = Some(embedder);
    self.vector_store = Some(vector_store);
    self
  }

  pub fn with_transform(
    mut self,
    name: impl Into<String>,
    transform: Arc<dyn UserTransform>,
  ) -> Self {
    self.transforms.insert(name.into(), transform);
    self
  }
}

impl fmt::Debug for Providers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut transforms: Vec<&String> = self.transforms.keys().collect();
    transforms.sort();
    f.debug_struct("Providers")
      .field("llm", &self.llm.is_some())
      .field("retrieval", &self.retrieval.is_some())
      .field("search", &self.search.is_some())
      .field("embedder", &self.embedder.is_some())
      .field("vector_store", &self.vector_store.is_some())
      .field("transforms", &transforms)
      .finish()
  }
}
