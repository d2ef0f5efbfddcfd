//! Fathom Node Runtime
//!
//! The contract between the execution engine and node executors:
//!
//! - [`NodeExecutor`]: one implementation per node type, registered once and
//!   invoked concurrently for every node of that type.
//! - [`ExecutionContext`]: the read-only snapshot of a run an executor sees.
//! - [`NodeOutput`]: the typed result each node type produces.
//! - Provider traits ([`LlmProvider`], [`RetrievalProvider`],
//!   [`SearchProvider`], [`Embedder`], [`VectorStore`], [`UserTransform`])
//!   that executors call out to for network I/O or user code.

mod context;
mod error;
mod executor;
mod output;
mod providers;

pub use context::{ExecutionContext, INPUT_KEY};
pub use error::{NodeError, NodeExecutionError, ProviderError, TransformError};
pub use executor::{NodeExecutor, cancellable};
pub use output::{
  CitationList, CompactContext, ConditionalOutput, DocumentList, KnowledgeBaseOutput, LlmOutput,
  NodeOutput, OutputValue, RetrievedDocument, TextContext, VectorDbOutput, WebSearchOutput,
};
pub use providers::{
  Embedder, GenerateRequest, GenerateResponse, LlmProvider, ProcessedQuery, RetrievalMetadata,
  RetrievalOptions, RetrievalProvider, RetrievalResponse, RetrievedChunk, SearchProvider,
  SearchRequest, TokenUsage, TransformInput, UserTransform, VectorQuery, VectorStore,
  WebSearchResult,
};
