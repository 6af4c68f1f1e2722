//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use noderank_shared::{AppConfig, PipelineConfig, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// noderank — enrich ranked Lightning nodes with per-node lookup data.
#[derive(Parser)]
#[command(
    name = "noderank",
    version,
    about = "Enrich a ranked node list with per-node lookup data and write it as JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Fetch, enrich, and write the aggregate file.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Overrides for a single run. Unset flags fall back to the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Config file to use instead of ~/.noderank/noderank.toml.
    #[arg(short, long, env = "NODERANK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output file path.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of enrichment workers (defaults to one per logical CPU).
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Per-request timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// URL of the ranked base list.
    #[arg(long)]
    pub list_url: Option<String>,

    /// Base URL for per-node lookups.
    #[arg(long)]
    pub node_url: Option<String>,
}

impl RunArgs {
    /// Apply the flags that were given on top of the file config.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(workers) = self.workers {
            config.pipeline.workers = Some(workers);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.source.timeout_ms = timeout_ms;
        }
        if let Some(list_url) = &self.list_url {
            config.source.list_url = list_url.clone();
        }
        if let Some(node_url) = &self.node_url {
            config.source.node_url_base = node_url.clone();
        }
    }
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

/// Crate targets that log, used to build the default filter.
const LOG_TARGETS: [&str; 4] = ["noderank", "noderank_core", "noderank_source", "noderank_shared"];

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(&args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Resolve the runtime pipeline config from file + flags.
fn resolve_pipeline_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    args.apply(&mut config);

    PipelineConfig::from_app(&config).map_err(|e| eyre!("invalid configuration: {e}"))
}

async fn cmd_run(args: &RunArgs) -> Result<()> {
    let config = resolve_pipeline_config(args)?;

    info!(
        list_url = %config.list_url,
        node_url = %config.node_url_base,
        workers = config.workers,
        timeout_ms = config.timeout.as_millis(),
        output = %config.output_path.display(),
        "starting enrichment run"
    );

    let summary = noderank_core::run(&config).await?;

    println!();
    println!("  Aggregate written.");
    println!("  Nodes:    {}", summary.base_records);
    println!("  Enriched: {}", summary.enriched);
    println!("  Skipped:  {}", summary.skipped);
    println!("  Bytes:    {}", summary.bytes_written);
    println!("  Path:     {}", summary.output_path.display());
    println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    println!();

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
