//! Fathom Config
//!
//! This crate contains the serializable workflow definition types for Fathom.
//! These types represent workflow graphs as they are authored (by the canvas,
//! a template, or by hand) before they are validated and resolved by the engine.
//!
//! Definitions can be loaded from:
//! - JSON files (via the CLI, `fathom run workflow workflow.json`)
//! - Canned templates (see `fathom-templates`)
//!
//! Each node carries a free-form `data` object keyed by its type tag. The
//! [`NodeConfig`] tagged union turns that object into a strongly-typed
//! configuration struct so executors never look fields up by name.

mod config;
mod edge;
mod kind;
mod node;
mod workflow;

pub use config::{
  ConditionalConfig, FunctionConfig, KnowledgeBaseConfig, LlmConfig, NodeConfig, OutputConfig,
  ResultFormat, SearchMode, TriggerConfig, TriggerType, VectorDbConfig, WebSearchConfig,
};
pub use edge::EdgeDef;
pub use kind::NodeKind;
pub use node::{NodeDef, Position};
pub use workflow::WorkflowDef;
