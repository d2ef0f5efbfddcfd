use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fathom_config::WorkflowDef;
use fathom_engine::{EngineConfig, WorkflowEngine};
use fathom_host_http::{
  HttpRetrievalClient, HttpVectorStore, OPENAI_BASE_URL, OpenAiClient, TAVILY_BASE_URL,
  TavilySearchClient,
};
use fathom_node_registry::ExecutorRegistry;
use fathom_nodes::{Providers, register_builtins};
use fathom_templates::TemplateStore;

/// Fathom - a DAG workflow engine for LLM pipelines
#[derive(Parser)]
#[command(name = "fathom")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Abort a workflow run after this many milliseconds
  #[arg(long, global = true, env = "FATHOM_TIMEOUT_MS")]
  timeout_ms: Option<u64>,

  /// Maximum number of nodes running at once
  #[arg(long, global = true, env = "FATHOM_MAX_PARALLEL")]
  max_parallel: Option<usize>,

  /// Fail nodes whose templates reference missing values
  #[arg(long, global = true)]
  strict_templates: bool,

  /// Template variable available as `{{KEY}}`, given as KEY=VALUE. VALUE is
  /// parsed as JSON when possible.
  #[arg(long = "var", global = true, value_parser = parse_var)]
  vars: Vec<(String, serde_json::Value)>,

  #[command(flatten)]
  providers: ProviderArgs,

  #[command(subcommand)]
  command: Option<Commands>,
}

/// Endpoints and credentials for provider-backed node types.
#[derive(Args)]
struct ProviderArgs {
  #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
  openai_api_key: Option<String>,

  #[arg(long, global = true, env = "OPENAI_BASE_URL", default_value = OPENAI_BASE_URL)]
  openai_base_url: String,

  #[arg(long, global = true, env = "FATHOM_LLM_MODEL")]
  llm_model: Option<String>,

  #[arg(long, global = true, env = "FATHOM_EMBEDDING_MODEL")]
  embedding_model: Option<String>,

  #[arg(long, global = true, env = "TAVILY_API_KEY", hide_env_values = true)]
  tavily_api_key: Option<String>,

  #[arg(long, global = true, env = "TAVILY_BASE_URL", default_value = TAVILY_BASE_URL)]
  tavily_base_url: String,

  /// Knowledge-base retrieval service
  #[arg(long, global = true, env = "FATHOM_RETRIEVAL_URL")]
  retrieval_url: Option<String>,

  #[arg(long, global = true, env = "FATHOM_RETRIEVAL_API_KEY", hide_env_values = true)]
  retrieval_api_key: Option<String>,

  /// Vector table service used by `lancedb` nodes
  #[arg(long, global = true, env = "FATHOM_VECTOR_URL")]
  vector_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow or a single node
  Run {
    #[command(subcommand)]
    target: RunTarget,
  },

  /// Validate a workflow file without running it
  Validate {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Browse the workflow templates
  Templates {
    /// Directory with additional `*.json` templates
    #[arg(long, env = "FATHOM_TEMPLATES_DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    action: TemplateAction,
  },
}

#[derive(Subcommand)]
enum RunTarget {
  /// Run an entire workflow
  Workflow {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Run a single node from a workflow
  Node {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// The node ID to execute
    #[arg(long)]
    node: String,
  },
}

#[derive(Subcommand)]
enum TemplateAction {
  /// List available templates
  List,

  /// Print a template definition
  Show { id: String },

  /// Print a new workflow created from a template
  Instantiate {
    id: String,

    #[arg(long)]
    name: Option<String>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(io::stderr)
    .with_target(false)
    .init();

  let cli = Cli::parse();
  let config = EngineConfig {
    timeout_ms: cli.timeout_ms,
    max_parallel_nodes: cli.max_parallel,
    strict_templates: cli.strict_templates,
    variables: cli.vars.into_iter().collect(),
  };

  match cli.command {
    Some(Commands::Run { target }) => {
      let engine = build_engine(&cli.providers, config)?;
      match target {
        RunTarget::Workflow { workflow_file } => run_workflow(&engine, &workflow_file).await?,
        RunTarget::Node {
          workflow_file,
          node,
        } => run_node(&engine, &workflow_file, &node).await?,
      }
    }
    Some(Commands::Validate { workflow_file }) => {
      let engine = build_engine(&cli.providers, config)?;
      validate(&engine, &workflow_file).await?;
    }
    Some(Commands::Templates { dir, action }) => {
      templates(dir.as_deref(), action).await?;
    }
    None => {
      println!("fathom - use --help to see available commands");
    }
  }

  Ok(())
}

/// Register every node type whose provider is configured.
fn build_engine(args: &ProviderArgs, config: EngineConfig) -> Result<WorkflowEngine> {
  let mut providers = Providers::default();

  if args.openai_api_key.is_some() || args.openai_base_url != OPENAI_BASE_URL {
    let mut client = OpenAiClient::new(&args.openai_base_url, args.openai_api_key.clone())
      .context("invalid OpenAI base URL")?;
    if let Some(model) = &args.llm_model {
      client = client.with_model(model);
    }
    if let Some(model) = &args.embedding_model {
      client = client.with_embedding_model(model);
    }
    let client = Arc::new(client);
    providers = providers.with_llm(client.clone());

    if let Some(url) = &args.vector_url {
      let store = HttpVectorStore::new(url).context("invalid vector service URL")?;
      providers = providers.with_vector_store(client, Arc::new(store));
    }
  }

  if let Some(key) = &args.tavily_api_key {
    let client = TavilySearchClient::new(&args.tavily_base_url, key.clone())
      .context("invalid Tavily base URL")?;
    providers = providers.with_search(Arc::new(client));
  }

  if let Some(url) = &args.retrieval_url {
    let client = HttpRetrievalClient::new(url, args.retrieval_api_key.clone())
      .context("invalid retrieval service URL")?;
    providers = providers.with_retrieval(Arc::new(client));
  }

  let mut registry = ExecutorRegistry::new();
  register_builtins(&mut registry, &providers);
  info!(node_types = ?registry.node_types(), "executors_registered");

  Ok(WorkflowEngine::new(Arc::new(registry), config))
}

async fn read_workflow(workflow_file: &Path) -> Result<WorkflowDef> {
  let content = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))
}

/// Cancel the run on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
  let cancel = CancellationToken::new();
  let token = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupt_received");
      token.cancel();
    }
  });
  cancel
}

async fn run_workflow(engine: &WorkflowEngine, workflow_file: &Path) -> Result<()> {
  let def = read_workflow(workflow_file).await?;
  let workflow = engine
    .validate(def)
    .context("workflow failed validation")?;
  let payload = read_payload_from_stdin()?;

  let result = engine
    .execute(&workflow, payload, cancel_on_interrupt())
    .await
    .context("workflow execution failed")?;

  for failure in &result.failures {
    warn!(error = %failure, "node_failure_tolerated");
  }

  println!("{}", serde_json::to_string_pretty(&result.output)?);
  Ok(())
}

async fn run_node(engine: &WorkflowEngine, workflow_file: &Path, node_id: &str) -> Result<()> {
  let def = read_workflow(workflow_file).await?;
  let workflow = engine
    .validate(def)
    .context("workflow failed validation")?;
  let payload = read_payload_from_stdin()?;

  let output = engine
    .execute_node(&workflow, node_id, payload, cancel_on_interrupt())
    .await
    .context("node execution failed")?;

  println!("{}", serde_json::to_string_pretty(&output.to_value())?);
  Ok(())
}

async fn validate(engine: &WorkflowEngine, workflow_file: &Path) -> Result<()> {
  let def = read_workflow(workflow_file).await?;
  match engine.validate(def) {
    Ok(workflow) => {
      println!(
        "ok: {} ({} nodes, {} edges)",
        workflow.name,
        workflow.nodes.len(),
        workflow.edges.len()
      );
      Ok(())
    }
    Err(e) => {
      for violation in e.violations() {
        eprintln!("- {}", violation);
      }
      bail!("{} violation(s) in {}", e.violations().len(), workflow_file.display());
    }
  }
}

async fn templates(dir: Option<&Path>, action: TemplateAction) -> Result<()> {
  let mut store = TemplateStore::builtin().context("failed to load built-in templates")?;
  if let Some(dir) = dir {
    let loaded = store.load_dir(dir).await?;
    info!(dir = %dir.display(), loaded, "templates_loaded");
  }

  match action {
    TemplateAction::List => {
      println!("{}", serde_json::to_string_pretty(&store.list())?);
    }
    TemplateAction::Show { id } => {
      let def = store
        .get(&id)
        .with_context(|| format!("template '{}' not found", id))?;
      println!("{}", serde_json::to_string_pretty(def)?);
    }
    TemplateAction::Instantiate { id, name } => {
      let def = store.instantiate(&id, name.as_deref())?;
      println!("{}", serde_json::to_string_pretty(&def)?);
    }
  }

  Ok(())
}

fn parse_var(raw: &str) -> Result<(String, serde_json::Value)> {
  let (key, value) = raw
    .split_once('=')
    .with_context(|| format!("expected KEY=VALUE, got '{}'", raw))?;
  let value = serde_json::from_str(value)
    .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
  Ok((key.trim().to_string(), value))
}

fn read_payload_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(serde_json::json!({}));
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read payload from stdin")?;

  if input.trim().is_empty() {
    Ok(serde_json::json!({}))
  } else {
    serde_json::from_str(&input).context("failed to parse payload JSON from stdin")
  }
}
