//! Fathom Workflow Engine
//!
//! Runs resolved workflows: validation, readiness scheduling with branch
//! pruning, concurrent node dispatch and result aggregation.
//!
//! # Usage
//!
//! ```ignore
//! use fathom_engine::{EngineConfig, WorkflowEngine};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut registry = ExecutorRegistry::new();
//! fathom_nodes::register_builtins(&mut registry, &providers);
//!
//! let engine = WorkflowEngine::new(Arc::new(registry), EngineConfig::default());
//! let workflow = engine.validate(def)?;
//! let result = engine
//!   .execute(&workflow, json!({ "query": "What is X?" }), CancellationToken::new())
//!   .await?;
//! ```

mod config;
mod engine;
mod error;
mod events;
mod result;
mod schedule;

pub use config::EngineConfig;
pub use engine::WorkflowEngine;
pub use error::ExecutionError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use result::{ExecutionResult, PartialExecution};
pub use schedule::NodeState;
