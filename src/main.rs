//! ads-copilot - plan advertising-account questions from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use ads_copilot::{ConfigService, DryRunHandler, JsonFileInventory, PipelineDeps, PipelineOutcome, QueryPipeline};
use ads_copilot_core::{ActionRegistry, PlanExecutor, Query};
use ads_copilot_llm::OpenAIProvider;
use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ads-copilot", about = "Plan advertising-account questions into catalog actions", version)]
struct Args {
    /// Settings file (defaults to settings.toml in the platform config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// JSON file with the user's campaigns and accounts.
    #[arg(short, long)]
    inventory: PathBuf,
    /// User the inventory is read for.
    #[arg(short, long, default_value = "cli-user")]
    user: String,
    #[arg(long, default_value = "cli")]
    session: String,
    /// Print the plan without running it through the dry-run executor.
    #[arg(long)]
    plan_only: bool,
    /// The question to plan.
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ConfigService::load(args.config.as_deref()).context("failed to load settings")?;
    let settings = config.settings().clone();

    let llm = OpenAIProvider::new(settings.llm.clone()).context("failed to build LLM provider")?;

    let mut registry = ActionRegistry::new();
    registry.register_all(Arc::new(DryRunHandler::new()));
    let executor = Arc::new(registry);

    let pipeline = QueryPipeline::new(
        &settings,
        PipelineDeps {
            llm: Arc::new(llm),
            inventory: Arc::new(JsonFileInventory::new(&args.inventory)),
            executor: executor.clone(),
            knowledge: None,
        },
    );

    let query = Query::new(args.query.join(" "), args.user, args.session);
    info!(config = %config.config_path().display(), "running query");
    let outcome = pipeline.run(&query).await;

    let mut execution = Vec::new();
    if let (PipelineOutcome::Plan(plan), false) = (&outcome, args.plan_only) {
        for group in &plan.action_groups {
            execution.push(executor.execute(group, &query.text).await.context("dry-run execution failed")?);
        }
    }

    let report = json!({
        "query": query.text,
        "result": outcome,
        "execution": execution,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
