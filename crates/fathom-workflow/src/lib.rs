//! Fathom Workflow
//!
//! This crate provides the resolved workflow representation for Fathom.
//! A resolved workflow is the validated form of a [`WorkflowDef`] that is
//! ready for execution.
//!
//! Key differences from `fathom-config`:
//! - Node `data` is parsed into a typed [`NodeConfig`]
//! - Nodes are indexed by id
//! - Graph structure (adjacency, upstream lookup, branch handles, cycles) is
//!   available through [`Graph`]
//!
//! [`WorkflowDef`]: fathom_config::WorkflowDef
//! [`NodeConfig`]: fathom_config::NodeConfig

mod edge;
mod error;
mod graph;
mod node;
mod workflow;

pub use edge::Edge;
pub use error::WorkflowError;
pub use graph::Graph;
pub use node::Node;
pub use workflow::Workflow;
