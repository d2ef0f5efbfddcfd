//! Workflow execution engine.
//!
//! The `WorkflowEngine` walks a resolved workflow, dispatching every node
//! whose inputs have settled onto its own tokio task. Conditional nodes prune
//! the branch they did not take; pruned nodes are skipped, never failed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fathom_config::{EdgeDef, NodeConfig, NodeDef, TriggerConfig, WorkflowDef};
use fathom_node_registry::ExecutorRegistry;
use fathom_node_runtime::{
  ExecutionContext, NodeError, NodeExecutionError, NodeExecutor, NodeOutput,
};
use fathom_resolver::{GraphValidationError, Resolver, StandardResolver, Violation};
use fathom_workflow::{Node, Workflow};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{Map, Value};
use tokio::task::JoinError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, info_span, instrument, warn};

use crate::config::EngineConfig;
use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::{ExecutionResult, PartialExecution};
use crate::schedule::{Schedule, Settled};

/// Workflow metadata key holding per-workflow template variables.
const VARIABLES_KEY: &str = "variables";

/// The workflow execution engine.
///
/// Generic over `N: ExecutionNotifier` to allow different notification strategies.
/// Use `WorkflowEngine::new()` for an engine with no-op notifications,
/// or `WorkflowEngine::with_notifier()` to provide a custom notifier.
pub struct WorkflowEngine<N: ExecutionNotifier = NoopNotifier> {
  registry: Arc<ExecutorRegistry>,
  resolver: StandardResolver,
  config: EngineConfig,
  notifier: N,
}

impl WorkflowEngine<NoopNotifier> {
  pub fn new(registry: Arc<ExecutorRegistry>, config: EngineConfig) -> Self {
    Self::with_notifier(registry, config, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> WorkflowEngine<N> {
  pub fn with_notifier(registry: Arc<ExecutorRegistry>, config: EngineConfig, notifier: N) -> Self {
    Self {
      resolver: StandardResolver::new(Arc::clone(&registry)),
      registry,
      config,
      notifier,
    }
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn registry(&self) -> &ExecutorRegistry {
    &self.registry
  }

  /// Validate a workflow definition against the registered node types.
  pub fn validate(&self, def: WorkflowDef) -> Result<Workflow, GraphValidationError> {
    self.resolver.resolve(def)
  }

  /// Validate raw nodes and edges, then run them.
  pub async fn execute_workflow(
    &self,
    nodes: Vec<NodeDef>,
    edges: Vec<EdgeDef>,
    input: Value,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, ExecutionError> {
    let def = WorkflowDef {
      id: uuid::Uuid::new_v4().to_string(),
      name: "ad-hoc".to_string(),
      description: None,
      nodes,
      edges,
      metadata: Map::new(),
    };
    let workflow = self.validate(def)?;
    self.execute(&workflow, input, cancel).await
  }

  /// Execute a workflow with the given payload as `input`.
  #[instrument(
    name = "workflow_execute",
    skip(self, workflow, payload, cancel),
    fields(
      workflow_id = %workflow.workflow_id,
      execution_id = tracing::field::Empty,
    )
  )]
  pub async fn execute(
    &self,
    workflow: &Workflow,
    payload: Value,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, ExecutionError> {
    self.check_runnable(workflow)?;

    let execution_id = uuid::Uuid::new_v4().to_string();
    Span::current().record("execution_id", execution_id.as_str());

    info!(
      execution_id = %execution_id,
      workflow_id = %workflow.workflow_id,
      nodes = workflow.nodes.len(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      workflow_id: workflow.workflow_id.clone(),
    });

    let result = self.run(workflow, &execution_id, payload, &cancel).await;

    match &result {
      Ok(_) => {
        info!(execution_id = %execution_id, "workflow_completed");
        self.notifier.notify(ExecutionEvent::WorkflowCompleted {
          execution_id: execution_id.clone(),
        });
      }
      Err(e) => {
        error!(execution_id = %execution_id, error = %e, "workflow_failed");
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id: execution_id.clone(),
          error: e.to_string(),
        });
      }
    }

    result
  }

  /// Execute a single node with the payload as `input`.
  ///
  /// This bypasses graph traversal; references to other nodes stay
  /// unresolved.
  #[instrument(name = "node_execute_isolated", skip(self, workflow, payload, cancel))]
  pub async fn execute_node(
    &self,
    workflow: &Workflow,
    node_id: &str,
    payload: Value,
    cancel: CancellationToken,
  ) -> Result<NodeOutput, ExecutionError> {
    let node = workflow
      .get_node(node_id)
      .ok_or_else(|| ExecutionError::NodeNotFound(node_id.to_string()))?;
    let executor = self.executor(node)?;

    let execution_id = uuid::Uuid::new_v4().to_string();
    let upstream = workflow
      .graph()
      .upstream(node_id)
      .into_iter()
      .map(str::to_string)
      .collect();
    let context = self
      .new_context(workflow, &execution_id, payload)
      .for_node(upstream);

    match executor.execute(node, &context, &cancel).await {
      Ok(output) => Ok(output),
      Err(cause) => Err(ExecutionError::NodeFailed {
        error: NodeExecutionError::new(node.node_id.clone(), node.node_type.clone(), cause),
        partial: Box::new(PartialExecution {
          execution_id,
          context,
          node_states: Default::default(),
        }),
      }),
    }
  }

  /// Structural checks for workflows that did not come through `validate`.
  fn check_runnable(&self, workflow: &Workflow) -> Result<(), GraphValidationError> {
    let mut violations = Vec::new();

    let mut ids: Vec<&String> = workflow.nodes.keys().collect();
    ids.sort();
    for id in ids {
      let Some(node) = workflow.get_node(id) else {
        continue;
      };
      match self.registry.get(&node.node_type) {
        Ok(executor) => {
          if let Err(issues) = executor.validate(node) {
            violations.push(Violation::ValidationFailed {
              node_id: id.clone(),
              node_type: node.node_type.clone(),
              issues,
            });
          }
        }
        Err(source) => violations.push(Violation::UnknownNodeType {
          node_id: id.clone(),
          source,
        }),
      }
    }

    if let Some(path) = workflow.graph().find_cycle() {
      violations.push(Violation::Cycle { path });
    }

    if violations.is_empty() {
      Ok(())
    } else {
      Err(GraphValidationError { violations })
    }
  }

  /// Fresh context for one run: the payload layered over trigger defaults,
  /// plus engine and workflow variables.
  fn new_context(
    &self,
    workflow: &Workflow,
    execution_id: &str,
    payload: Value,
  ) -> ExecutionContext {
    let mut variables = self.config.variables.clone();
    if let Some(Value::Object(overrides)) = workflow.metadata.get(VARIABLES_KEY) {
      variables.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    ExecutionContext::new(execution_id, seed_input(workflow, payload))
      .with_variables(variables)
      .with_strictness(self.config.strictness())
  }

  fn executor(&self, node: &Node) -> Result<Arc<dyn NodeExecutor>, ExecutionError> {
    self.registry.get(&node.node_type).map_err(|source| {
      ExecutionError::Validation(GraphValidationError {
        violations: vec![Violation::UnknownNodeType {
          node_id: node.node_id.clone(),
          source,
        }],
      })
    })
  }

  /// Run the main scheduling loop.
  async fn run(
    &self,
    workflow: &Workflow,
    execution_id: &str,
    payload: Value,
    cancel: &CancellationToken,
  ) -> Result<ExecutionResult, ExecutionError> {
    let graph = workflow.graph();
    let mut schedule = Schedule::new(workflow);
    let mut context = self.new_context(workflow, execution_id, payload);

    // Executors see a child token so a timeout can stop them without
    // cancelling the caller's token.
    let run_cancel = cancel.child_token();
    let deadline = self
      .config
      .timeout_ms
      .map(|ms| Instant::now() + Duration::from_millis(ms));
    let limit = self.config.max_parallel_nodes.unwrap_or(usize::MAX).max(1);

    let mut in_flight = FuturesUnordered::new();
    let mut failures: Vec<NodeExecutionError> = Vec::new();
    let mut fatal: Option<NodeExecutionError> = None;

    loop {
      if fatal.is_none() {
        for settled in schedule.settle() {
          match settled {
            Settled::Skipped(node_id) => {
              debug!(execution_id = %execution_id, node_id = %node_id, "node_skipped");
              self.notifier.notify(ExecutionEvent::NodeSkipped {
                execution_id: execution_id.to_string(),
                node_id,
              });
            }
            Settled::Fatal(node_id) => {
              if let Some(index) = failures.iter().position(|f| f.node_id == node_id) {
                fatal = Some(failures.remove(index));
              }
            }
          }
        }
      }

      if fatal.is_none() {
        for node_id in schedule.ready() {
          if in_flight.len() >= limit {
            break;
          }
          let node = workflow
            .get_node(&node_id)
            .ok_or_else(|| ExecutionError::NodeNotFound(node_id.clone()))?;
          let executor = self.executor(node)?;
          let upstream = graph
            .upstream(&node_id)
            .into_iter()
            .map(str::to_string)
            .collect();

          schedule.start(&node_id);
          info!(
            execution_id = %execution_id,
            node_id = %node_id,
            node_type = %node.node_type,
            "node_started"
          );
          self.notifier.notify(ExecutionEvent::NodeStarted {
            execution_id: execution_id.to_string(),
            node_id: node_id.clone(),
            node_type: node.node_type.clone(),
          });

          in_flight.push(spawn_node(
            node.clone(),
            executor,
            context.for_node(upstream),
            run_cancel.clone(),
          ));
        }
      }

      if in_flight.is_empty() {
        break;
      }

      let (node_id, joined) = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
          warn!(execution_id = %execution_id, "workflow cancelled");
          return Err(ExecutionError::Cancelled {
            partial: partial(execution_id, &context, &schedule),
          });
        }
        _ = deadline_elapsed(deadline) => {
          run_cancel.cancel();
          warn!(execution_id = %execution_id, "workflow timed out");
          return Err(ExecutionError::Timeout {
            timeout_ms: self.config.timeout_ms.unwrap_or_default(),
            partial: partial(execution_id, &context, &schedule),
          });
        }
        Some(next) = in_flight.next() => next,
      };

      let node_type = workflow
        .get_node(&node_id)
        .map(|n| n.node_type.clone())
        .unwrap_or_default();

      match joined {
        Err(source) => {
          run_cancel.cancel();
          return Err(ExecutionError::Join { node_id, source });
        }
        Ok(Ok(output)) => {
          let data = output.to_value();
          info!(
            execution_id = %execution_id,
            node_id = %node_id,
            output = %data,
            "node_completed"
          );
          self.notifier.notify(ExecutionEvent::NodeCompleted {
            execution_id: execution_id.to_string(),
            node_id: node_id.clone(),
            data,
          });

          let branch = match &output {
            NodeOutput::Conditional(out) => Some(out.branch.clone()),
            _ => None,
          };
          schedule.complete(&node_id, branch.as_deref());
          context.insert_result(node_id, output);
        }
        Ok(Err(cause)) => {
          let failure = NodeExecutionError::new(node_id.clone(), node_type, cause);
          error!(
            execution_id = %execution_id,
            node_id = %node_id,
            error = %failure,
            "node_failed"
          );
          self.notifier.notify(ExecutionEvent::NodeFailed {
            execution_id: execution_id.to_string(),
            node_id: node_id.clone(),
            error: failure.to_string(),
          });

          let has_consumers = schedule.fail(&node_id);
          if !has_consumers && fatal.is_none() {
            fatal = Some(failure);
          } else {
            failures.push(failure);
          }
        }
      }
    }

    if let Some(error) = fatal {
      return Err(ExecutionError::NodeFailed {
        error,
        partial: partial(execution_id, &context, &schedule),
      });
    }

    for failure in &failures {
      warn!(
        execution_id = %execution_id,
        node_id = %failure.node_id,
        "node failure tolerated, every consumer was pruned"
      );
    }

    Ok(ExecutionResult {
      execution_id: execution_id.to_string(),
      output: aggregate(&context),
      node_states: schedule.node_states(),
      context,
      failures,
    })
  }
}

/// Merge every trigger's `defaultInput` under the payload, so `{{input.*}}`
/// sees defaults anywhere in the graph. Payload keys win; between triggers
/// the lowest id wins.
fn seed_input(workflow: &Workflow, payload: Value) -> Value {
  let mut ids: Vec<&String> = workflow.nodes.keys().collect();
  ids.sort();

  let mut defaults = Map::new();
  for id in ids {
    if let Some(Node {
      config: NodeConfig::Trigger(TriggerConfig {
        default_input: Some(default_input),
        ..
      }),
      ..
    }) = workflow.get_node(id)
    {
      for (key, value) in default_input {
        defaults.entry(key.clone()).or_insert_with(|| value.clone());
      }
    }
  }

  if defaults.is_empty() {
    return payload;
  }
  match payload {
    Value::Object(fields) => {
      defaults.extend(fields);
      Value::Object(defaults)
    }
    Value::Null => Value::Object(defaults),
    other => other,
  }
}

/// Spawn a node on its own task, tagging the join result with its id.
fn spawn_node(
  node: Node,
  executor: Arc<dyn NodeExecutor>,
  context: ExecutionContext,
  cancel: CancellationToken,
) -> impl Future<Output = (String, Result<Result<NodeOutput, NodeError>, JoinError>)> {
  let node_id = node.node_id.clone();
  let span = info_span!(
    "node_execute",
    execution_id = %context.execution_id(),
    node_id = %node.node_id,
    node_type = %node.node_type,
  );
  let handle = tokio::spawn(
    async move { executor.execute(&node, &context, &cancel).await }.instrument(span),
  );

  async move { (node_id, handle.await) }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
  match deadline {
    Some(deadline) => tokio::time::sleep_until(deadline).await,
    None => std::future::pending().await,
  }
}

fn partial(
  execution_id: &str,
  context: &ExecutionContext,
  schedule: &Schedule,
) -> Box<PartialExecution> {
  Box::new(PartialExecution {
    execution_id: execution_id.to_string(),
    context: context.clone(),
    node_states: schedule.node_states(),
  })
}

/// `{variableName: value}` of every completed output node, or the whole
/// context when none completed.
fn aggregate(context: &ExecutionContext) -> Value {
  let mut ids: Vec<&String> = context.results().keys().collect();
  ids.sort();

  let mut outputs = Map::new();
  for id in ids {
    if let Some(NodeOutput::Output(out)) = context.result(id) {
      if outputs
        .insert(out.variable_name.clone(), out.value.clone())
        .is_some()
      {
        warn!(
          execution_id = %context.execution_id(),
          node_id = %id,
          variable_name = %out.variable_name,
          "output_variable_overwritten"
        );
      }
    }
  }

  if outputs.is_empty() {
    context.to_json()
  } else {
    Value::Object(outputs)
  }
}
