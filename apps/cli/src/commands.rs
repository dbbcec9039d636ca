//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::Deserialize;
use tracing::info;

use topicflow_core::{ExecuteOptions, ExecuteResult, PipelineExecutor, Registry};
use topicflow_shared::{
    AppConfig, PipelineConfig, ProcessingItem, SharedItem, StageStats, init_config, load_config,
    load_pipeline_from,
};
use topicflow_storage::{Storage, VersionRecord};
use topicflow_text::{ClusterDocument, ClusterOptions, TitleStrategy, cluster};

use crate::progress::CliProgress;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Topicflow: clean, deduplicate and cluster news batches.
#[derive(Parser)]
#[command(
    name = "topicflow",
    version,
    about = "Run document processing pipelines and group news items by topic.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Database file (overrides `defaults.database_path`).
    #[arg(long, global = true, env = "TOPICFLOW_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the descriptors of all registered processors as JSON.
    Processors,

    /// Check a pipeline file against the registry.
    Validate {
        /// Pipeline JSON file (`{"processors": [...]}`).
        #[arg(long)]
        pipeline: PathBuf,

        /// Optional JSON array of items to check data requirements against.
        #[arg(long)]
        items: Option<PathBuf>,
    },

    /// Import items into a run as draft documents.
    Import {
        #[arg(long)]
        run_id: i64,

        /// JSON array of items.
        #[arg(long)]
        items: PathBuf,
    },

    /// Mark every draft document of a run as published.
    Publish {
        #[arg(long)]
        run_id: i64,
    },

    /// Execute a pipeline over a run's draft documents.
    Run {
        #[arg(long)]
        run_id: i64,

        /// Pipeline JSON file (defaults to the `[pipeline]` config section).
        #[arg(long)]
        pipeline: Option<PathBuf>,

        /// Item cap for previews (defaults to `defaults.preview_sample_limit`; 0 loads everything).
        #[arg(long)]
        sample_limit: Option<usize>,

        /// Run over the whole batch and store the result as a new version.
        #[arg(long)]
        save: bool,

        /// Write the full result as JSON to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cluster a JSON array of `{id, title, text}` documents directly.
    Cluster {
        #[arg(long)]
        items: PathBuf,

        /// Minimum cosine similarity to a cluster's seed.
        #[arg(long, default_value_t = 0.35)]
        threshold: f64,

        /// Smallest group kept as a cluster.
        #[arg(long, default_value_t = 2)]
        min_size: usize,

        /// Cluster titles: terms or smart.
        #[arg(long, default_value = "terms")]
        title_strategy: String,
    },

    /// List saved versions of a run, or show one.
    Versions {
        #[arg(long)]
        run_id: i64,

        /// Print this version (by id) as JSON instead of the list.
        #[arg(long)]
        show: Option<i64>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "topicflow=info",
        1 => "topicflow=debug",
        _ => "topicflow=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let db = cli.db;
    match cli.command {
        Command::Processors => cmd_processors(),
        Command::Validate { pipeline, items } => cmd_validate(&pipeline, items.as_deref()),
        Command::Import { run_id, items } => cmd_import(db, run_id, &items).await,
        Command::Publish { run_id } => cmd_publish(db, run_id).await,
        Command::Run {
            run_id,
            pipeline,
            sample_limit,
            save,
            output,
        } => {
            cmd_run(
                db,
                run_id,
                pipeline.as_deref(),
                sample_limit,
                save,
                output.as_deref(),
            )
            .await
        }
        Command::Cluster {
            items,
            threshold,
            min_size,
            title_strategy,
        } => cmd_cluster(&items, threshold, min_size, &title_strategy),
        Command::Versions { run_id, show } => cmd_versions(db, run_id, show).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn open_storage(db: Option<PathBuf>, config: &AppConfig) -> Result<Storage> {
    let path = db.unwrap_or_else(|| PathBuf::from(&config.defaults.database_path));
    info!(path = %path.display(), "opening database");
    Ok(Storage::open(&path).await?)
}

fn read_items(path: &Path) -> Result<Vec<ProcessingItem>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("cannot read items from {}", path.display()))?;
    serde_json::from_str(&content)
        .wrap_err_with(|| format!("{} is not a JSON array of items", path.display()))
}

fn resolve_pipeline(path: Option<&Path>, config: &AppConfig) -> Result<PipelineConfig> {
    Ok(match path {
        Some(p) => load_pipeline_from(p)?,
        None => config.pipeline.to_pipeline(),
    })
}

/// Fixed-width table of stage statistics.
fn stage_table(stages: &[StageStats]) -> String {
    let mut out = format!(
        "  {:<6} {:<28} {:>6} {:>6} {:>8} {:>9} {:>8}\n",
        "order", "processor", "in", "out", "removed", "clusters", "ms"
    );
    for s in stages {
        let clusters = s
            .clusters_created
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        out.push_str(&format!(
            "  {:<6} {:<28} {:>6} {:>6} {:>8} {:>9} {:>8}\n",
            s.order, s.processor_name, s.items_in, s.items_out, s.items_removed, clusters, s.duration_ms
        ));
    }
    out
}

fn print_result(result: &ExecuteResult) {
    println!();
    print!("{}", stage_table(&result.stages));
    println!();
    for warning in &result.warnings {
        println!("  warning [{}]: {}", warning.processor_id, warning.message);
    }
    match &result.clusters {
        Some(clusters) => {
            println!("  Clusters: {}", clusters.len());
            for c in clusters {
                println!(
                    "    {:>3}  {:.2}  {}",
                    c.mentions_count, c.avg_similarity, c.title
                );
            }
        }
        None => println!("  Clusters: none (no clustering stage)"),
    }
    println!("  Documents: {}", result.items.len());
    println!("  Time:      {}ms", result.total_duration_ms());
    println!();
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_processors() -> Result<()> {
    let registry = Registry::with_builtins()?;
    println!("{}", serde_json::to_string_pretty(&registry.metadata())?);
    Ok(())
}

fn cmd_validate(pipeline: &Path, items: Option<&Path>) -> Result<()> {
    let registry = Registry::with_builtins()?;
    let pipeline = load_pipeline_from(pipeline)?;
    let sample: Option<Vec<SharedItem>> = match items {
        Some(path) => Some(read_items(path)?.into_iter().map(Arc::new).collect()),
        None => None,
    };

    let report = registry.validate(&pipeline, sample.as_deref());
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.valid {
        return Err(eyre!("pipeline is invalid: {}", report.error_message()));
    }
    Ok(())
}

async fn cmd_import(db: Option<PathBuf>, run_id: i64, items: &Path) -> Result<()> {
    let config = load_config()?;
    let items = read_items(items)?;
    let storage = open_storage(db, &config).await?;

    let ids = storage.import_items(run_id, &items).await?;
    println!("Imported {} documents into run {run_id}", ids.len());
    Ok(())
}

async fn cmd_publish(db: Option<PathBuf>, run_id: i64) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(db, &config).await?;

    let published = storage.publish_run(run_id).await?;
    println!("Published {published} documents of run {run_id}");
    Ok(())
}

async fn cmd_run(
    db: Option<PathBuf>,
    run_id: i64,
    pipeline: Option<&Path>,
    sample_limit: Option<usize>,
    save: bool,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config()?;
    let pipeline = resolve_pipeline(pipeline, &config)?;
    let storage = open_storage(db, &config).await?;

    // Saved versions always cover the whole batch.
    let sample_limit = if save {
        None
    } else {
        Some(sample_limit.unwrap_or(config.defaults.preview_sample_limit))
    };

    info!(run_id, save, ?sample_limit, "executing pipeline");

    let registry = Arc::new(Registry::with_builtins()?);
    let executor = PipelineExecutor::new(registry, storage);
    let progress = CliProgress::new();
    let result = executor
        .execute_with(run_id, &pipeline, ExecuteOptions { sample_limit }, &progress)
        .await?;

    print_result(&result);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json)
            .wrap_err_with(|| format!("cannot write result to {}", path.display()))?;
        println!("  Result written to {}", path.display());
    }

    if save {
        let clusters = result.clusters.clone().unwrap_or_default();
        let summary = executor
            .loader()
            .save_version(
                run_id,
                VersionRecord {
                    pipeline: &pipeline,
                    total_documents: result.items.len(),
                    stages: &result.stages,
                    clusters: &clusters,
                },
            )
            .await?;
        println!(
            "  Saved version {} of run {run_id} (id {})",
            summary.version, summary.id
        );
    }

    Ok(())
}

/// Input shape for `topicflow cluster`.
#[derive(Debug, Deserialize)]
struct ClusterInput {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    text: String,
}

fn cmd_cluster(items: &Path, threshold: f64, min_size: usize, title_strategy: &str) -> Result<()> {
    let content = std::fs::read_to_string(items)
        .wrap_err_with(|| format!("cannot read documents from {}", items.display()))?;
    let inputs: Vec<ClusterInput> = serde_json::from_str(&content)
        .wrap_err_with(|| format!("{} is not a JSON array of documents", items.display()))?;

    let opts = ClusterOptions {
        threshold,
        min_cluster_size: min_size,
        title_strategy: title_strategy.parse::<TitleStrategy>().map_err(|e| eyre!(e))?,
        ..ClusterOptions::default()
    };
    let docs: Vec<ClusterDocument<'_>> = inputs
        .iter()
        .map(|d| ClusterDocument {
            id: d.id,
            title: &d.title,
            text: &d.text,
        })
        .collect();

    let outcome = cluster(&docs, &opts);
    let report = serde_json::json!({
        "clusters": outcome.clusters,
        "singles": outcome.singles,
        "belowTokenFloor": outcome.below_token_floor,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn cmd_versions(db: Option<PathBuf>, run_id: i64, show: Option<i64>) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(db, &config).await?;

    if let Some(version_id) = show {
        let saved = storage
            .load_version(version_id)
            .await?
            .filter(|v| v.summary.run_id == run_id)
            .ok_or_else(|| eyre!("version {version_id} not found for run {run_id}"))?;
        println!("{}", serde_json::to_string_pretty(&saved)?);
        return Ok(());
    }

    let versions = storage.list_versions(run_id).await?;
    if versions.is_empty() {
        println!("No saved versions for run {run_id}");
        return Ok(());
    }

    println!(
        "  {:<6} {:<8} {:<25} {:>9} {:>9} {:>8}",
        "id", "version", "created", "documents", "clusters", "ms"
    );
    for v in versions {
        println!(
            "  {:<6} {:<8} {:<25} {:>9} {:>9} {:>8}",
            v.id,
            v.version,
            v.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            v.stats.total_documents,
            v.stats.total_clusters,
            v.stats.total_duration
        );
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
