//! Fathom Node Registry
//!
//! Maps node type tags (`llm`, `knowledge-base`, or any custom tag) to the
//! [`NodeExecutor`](fathom_node_runtime::NodeExecutor) that runs them. The
//! registry is built once at startup and shared with the resolver and the
//! engine behind an `Arc`.

mod error;
mod registry;

pub use error::UnknownNodeTypeError;
pub use registry::ExecutorRegistry;
